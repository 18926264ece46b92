//! Evaluation of search filters against a graph.

use hashbrown::HashSet;

use crate::model::vocab::{classes, xsd};
use crate::model::{Statement, Thing, ThingId, TypedValue};

use super::{FilterValue, SearchFilter};

/// Read access to outgoing statements, the only thing matching needs.
pub trait GraphView {
    fn outgoing(&self, subject: &ThingId) -> Vec<&Statement>;
}

/// True when every filter matches `root`.
pub fn matches_all<G: GraphView>(filters: &[SearchFilter], graph: &G, root: &Thing) -> bool {
    filters.iter().all(|f| f.matches(graph, root))
}

impl SearchFilter {
    /// Whether some target reachable from `root` over this filter's path
    /// satisfies the range and at least one value.
    pub fn matches<G: GraphView>(&self, graph: &G, root: &Thing) -> bool {
        let mut frontier = bounded_neighbourhood(graph, root, self.prefix_depth());

        for predicate in &self.path {
            let mut seen = HashSet::new();
            let mut next = Vec::new();
            for thing in frontier {
                for statement in graph.outgoing(thing.id()) {
                    if &statement.predicate.id == predicate && seen.insert(statement.object.id()) {
                        next.push(&statement.object);
                    }
                }
            }
            if next.is_empty() {
                return false;
            }
            frontier = next;
        }

        frontier
            .into_iter()
            .any(|target| self.in_range(target) && self.values.iter().any(|v| v.matches(target)))
    }

    fn in_range(&self, target: &Thing) -> bool {
        let range = self.range.as_str();
        match target {
            Thing::Resource(r) => range == classes::RESOURCES || r.classes.contains(&self.range),
            Thing::Literal(l) => match xsd::normalize(&l.datatype).as_str() {
                xsd::INTEGER | xsd::INT => range == classes::INTEGER,
                xsd::STRING => range == classes::STRING,
                xsd::DECIMAL | xsd::FLOAT => range == classes::DECIMAL || range == classes::FLOAT,
                xsd::DATE => range == classes::DATE,
                xsd::BOOLEAN => range == classes::BOOLEAN,
                xsd::ANY_URI => range == classes::URI,
                _ => false,
            },
            Thing::Predicate(_) => range == classes::PREDICATES,
            Thing::Class(_) => range == classes::CLASSES,
        }
    }
}

impl FilterValue {
    /// Literals compare in the domain of their datatype; everything else
    /// compares by id. Values that do not parse never match.
    pub fn matches(&self, target: &Thing) -> bool {
        match target {
            Thing::Literal(literal) => {
                let actual = TypedValue::parse(&literal.label, &literal.datatype);
                let expected = TypedValue::parse(&self.value, &literal.datatype);
                match (actual, expected) {
                    (Some(a), Some(e)) => a.compare(&e).is_some_and(|ord| self.op.holds(ord)),
                    _ => false,
                }
            }
            other => self.op.holds(other.id().as_str().cmp(self.value.as_str())),
        }
    }
}

/// The root plus everything reachable from it in at most `depth` hops.
fn bounded_neighbourhood<'g, G: GraphView>(graph: &'g G, root: &'g Thing, depth: usize) -> Vec<&'g Thing> {
    let mut visited: HashSet<&ThingId> = HashSet::new();
    visited.insert(root.id());
    let mut result = vec![root];
    let mut layer = vec![root];

    for _ in 0..depth {
        let mut next = Vec::new();
        for thing in &layer {
            for statement in graph.outgoing(thing.id()) {
                if visited.insert(statement.object.id()) {
                    next.push(&statement.object);
                }
            }
        }
        if next.is_empty() {
            break;
        }
        result.extend(next.iter().copied());
        layer = next;
    }

    result
}
