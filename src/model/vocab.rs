//! Well-known class and predicate ids of the scholarly graph.

/// Class ids.
pub mod classes {
    pub const PAPER: &str = "Paper";
    pub const CONTRIBUTION: &str = "Contribution";
    pub const PROBLEM: &str = "Problem";
    pub const RESEARCH_FIELD: &str = "ResearchField";
    pub const COMPARISON: &str = "Comparison";
    pub const VISUALIZATION: &str = "Visualization";
    pub const TABLE: &str = "Table";
    pub const ROW: &str = "Row";
    pub const DATASET: &str = "Dataset";
    pub const BENCHMARK: &str = "C14022";
    pub const NODE_SHAPE: &str = "NodeShape";
    pub const ROSETTA_NODE_SHAPE: &str = "RosettaNodeShape";
    pub const ROSETTA_STONE_STATEMENT: &str = "RosettaStoneStatement";

    /// Marker ranges used by search filters.
    pub const RESOURCE: &str = "Resource";
    pub const RESOURCES: &str = "Resources";
    pub const PREDICATES: &str = "Predicates";
    pub const CLASSES: &str = "Classes";
    pub const LITERAL: &str = "Literal";

    pub const STRING: &str = "String";
    pub const INTEGER: &str = "Integer";
    pub const DECIMAL: &str = "Decimal";
    pub const FLOAT: &str = "Float";
    pub const BOOLEAN: &str = "Boolean";
    pub const DATE: &str = "Date";
    pub const URI: &str = "URI";
}

/// Predicate ids.
pub mod predicates {
    pub const HAS_DOI: &str = "P26";
    pub const HAS_RESEARCH_FIELD: &str = "P30";
    pub const HAS_CONTRIBUTION: &str = "P31";
    pub const HAS_RESEARCH_PROBLEM: &str = "P32";
    pub const HAS_SUBFIELD: &str = "P36";
    pub const HAS_BENCHMARK: &str = "HAS_BENCHMARK";
    pub const HAS_DATASET: &str = "HAS_DATASET";
    pub const HAS_SOURCE_CODE: &str = "HAS_SOURCE_CODE";
    pub const COMPARES_CONTRIBUTION: &str = "compareContribution";
    pub const DESCRIPTION: &str = "description";
    pub const HAS_ROW: &str = "CSVW_Rows";
}

/// XSD datatypes of literals.
pub mod xsd {
    pub const STRING: &str = "xsd:string";
    pub const INTEGER: &str = "xsd:integer";
    pub const INT: &str = "xsd:int";
    pub const DECIMAL: &str = "xsd:decimal";
    pub const FLOAT: &str = "xsd:float";
    pub const BOOLEAN: &str = "xsd:boolean";
    pub const DATE: &str = "xsd:date";
    pub const ANY_URI: &str = "xsd:anyURI";

    const NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema#";

    /// Normalize a datatype to its `xsd:` prefixed form.
    pub fn normalize(datatype: &str) -> String {
        match datatype.strip_prefix(NAMESPACE) {
            Some(local) => format!("xsd:{local}"),
            None => datatype.to_string(),
        }
    }
}
