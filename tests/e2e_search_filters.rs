//! End-to-end tests for paper search by contribution filters.
//!
//! Each test builds a small scholarly graph through the public `Orkg` handle
//! and runs `PaperService::list_by_filters` against the memory backend.

use orkg_graph::content::{
    CreateContributionCommand, CreateObservatoryCommand, CreateObservatoryFilterCommand, CreatePaperCommand,
    UpdatePaperCommand,
};
use orkg_graph::model::vocab::{classes, predicates};
use orkg_graph::search::parse_filters;
use orkg_graph::{
    ContributorId, Error, FilterValue, MemoryGraph, ObservatoryId, Operator, Orkg, PageRequest, SearchFilter,
    ThingId, Visibility, VisibilityFilter,
};

struct Fixture {
    orkg: Orkg<MemoryGraph>,
    observatory: ObservatoryId,
    problem1: ThingId,
    problem2: ThingId,
    method: ThingId,
    year: ThingId,
    paper1: ThingId,
    paper2: ThingId,
    paper3: ThingId,
}

/// paper1 (observatory, featured) -> c1 -> problem1, method m1 (year 2019)
/// paper2                           -> c2 -> problem2, method m2 (year 2021)
/// paper3 has no contributions
async fn fixture() -> Fixture {
    let orkg = Orkg::open_memory().await.unwrap();
    let who = ContributorId::random();
    let observatory = ObservatoryId::random();

    let problem1 = orkg.research_problems().create("Entity linking", who).await.unwrap();
    let problem2 = orkg.research_problems().create("Question answering", who).await.unwrap();
    let method_class = orkg.create_class("Method").await.unwrap();
    let method = orkg.create_predicate("uses method").await.unwrap();
    let year = orkg.create_predicate("year").await.unwrap();

    let m1 = orkg.create_resource("BERT", method_class.as_str()).await.unwrap();
    let m2 = orkg.create_resource("GPT", method_class.as_str()).await.unwrap();
    let y2019 = orkg.create_typed_literal("2019", "xsd:integer").await.unwrap();
    let y2021 = orkg.create_typed_literal("2021", "xsd:integer").await.unwrap();
    orkg.link(&m1, &year, &y2019).await.unwrap();
    orkg.link(&m2, &year, &y2021).await.unwrap();

    let paper1 = orkg
        .papers()
        .create(
            CreatePaperCommand::new("Linking entities", who)
                .with_observatory(observatory)
                .with_contribution(CreateContributionCommand {
                    label: "Contribution 1".into(),
                    research_problems: vec![problem1.clone()],
                    statements: vec![(method.clone(), m1)],
                }),
        )
        .await
        .unwrap();
    let mut featured = UpdatePaperCommand::new(paper1.clone(), who);
    featured.visibility = Some(Visibility::Featured);
    orkg.papers().update(featured).await.unwrap();

    let paper2 = orkg
        .papers()
        .create(CreatePaperCommand::new("Answering questions", who).with_contribution(CreateContributionCommand {
            label: "Contribution 1".into(),
            research_problems: vec![problem2.clone()],
            statements: vec![(method.clone(), m2)],
        }))
        .await
        .unwrap();
    let paper3 = orkg.papers().create(CreatePaperCommand::new("Empty paper", who)).await.unwrap();

    Fixture { orkg, observatory, problem1, problem2, method, year, paper1, paper2, paper3 }
}

fn id(s: &'static str) -> ThingId {
    ThingId::from_static(s)
}

fn ids(page: &orkg_graph::Page<orkg_graph::Resource>) -> Vec<ThingId> {
    let mut ids: Vec<ThingId> = page.content.iter().map(|r| r.id.clone()).collect();
    ids.sort();
    ids
}

async fn listing(orkg: &Orkg<MemoryGraph>, visibility: VisibilityFilter) -> Vec<ThingId> {
    let page = orkg.papers().list_by_filters(None, &[], visibility, &PageRequest::default()).await.unwrap();
    ids(&page)
}

fn sorted(mut v: Vec<ThingId>) -> Vec<ThingId> {
    v.sort();
    v
}

// ============================================================================
// 1. No filters returns every paper
// ============================================================================

#[tokio::test]
async fn test_no_filters_returns_all_papers() {
    let f = fixture().await;
    let page = f
        .orkg
        .papers()
        .list_by_filters(None, &[], VisibilityFilter::AllListed, &PageRequest::default())
        .await
        .unwrap();
    assert_eq!(ids(&page), sorted(vec![f.paper1, f.paper2, f.paper3]));
}

// ============================================================================
// 2. Exact single-hop filter on the research problem
// ============================================================================

#[tokio::test]
async fn test_exact_problem_filter() {
    let f = fixture().await;
    let filter = SearchFilter::new(
        [id(predicates::HAS_RESEARCH_PROBLEM)],
        id(classes::PROBLEM),
        [FilterValue::equal_to(f.problem1.as_str())],
        true,
    )
    .unwrap();
    let page = f
        .orkg
        .papers()
        .list_by_filters(None, &[filter], VisibilityFilter::AllListed, &PageRequest::default())
        .await
        .unwrap();
    assert_eq!(ids(&page), vec![f.paper1]);
}

// ============================================================================
// 3. Values OR-combine within a filter
// ============================================================================

#[tokio::test]
async fn test_values_or_combine() {
    let f = fixture().await;
    let filter = SearchFilter::new(
        [id(predicates::HAS_RESEARCH_PROBLEM)],
        id(classes::RESOURCES),
        [FilterValue::equal_to(f.problem1.as_str()), FilterValue::equal_to(f.problem2.as_str())],
        true,
    )
    .unwrap();
    let page = f
        .orkg
        .papers()
        .list_by_filters(None, &[filter], VisibilityFilter::AllListed, &PageRequest::default())
        .await
        .unwrap();
    assert_eq!(ids(&page), sorted(vec![f.paper1, f.paper2]));
}

// ============================================================================
// 4. Filters AND-combine
// ============================================================================

#[tokio::test]
async fn test_filters_and_combine() {
    let f = fixture().await;
    let problem = SearchFilter::new(
        [id(predicates::HAS_RESEARCH_PROBLEM)],
        id(classes::RESOURCES),
        [FilterValue::equal_to(f.problem1.as_str())],
        true,
    )
    .unwrap();
    let recent = SearchFilter::new(
        [f.method.clone(), f.year.clone()],
        id(classes::INTEGER),
        [FilterValue::new(Operator::Gt, "2020")],
        true,
    )
    .unwrap();

    let both = f
        .orkg
        .papers()
        .list_by_filters(None, &[problem, recent.clone()], VisibilityFilter::AllListed, &PageRequest::default())
        .await
        .unwrap();
    assert!(both.is_empty());

    let only_recent = f
        .orkg
        .papers()
        .list_by_filters(None, &[recent], VisibilityFilter::AllListed, &PageRequest::default())
        .await
        .unwrap();
    assert_eq!(ids(&only_recent), vec![f.paper2]);
}

// ============================================================================
// 5. Inexact filters may start deeper in the contribution subgraph
// ============================================================================

#[tokio::test]
async fn test_inexact_path_prefix() {
    let f = fixture().await;
    let exact = SearchFilter::new([f.year.clone()], id(classes::INTEGER), [FilterValue::new(Operator::Lt, "2020")], true)
        .unwrap();
    let page = f
        .orkg
        .papers()
        .list_by_filters(None, &[exact], VisibilityFilter::AllListed, &PageRequest::default())
        .await
        .unwrap();
    assert!(page.is_empty(), "the year hangs off the method, not the contribution");

    let inexact =
        SearchFilter::new([f.year.clone()], id(classes::INTEGER), [FilterValue::new(Operator::Lt, "2020")], false)
            .unwrap();
    let page = f
        .orkg
        .papers()
        .list_by_filters(None, &[inexact], VisibilityFilter::AllListed, &PageRequest::default())
        .await
        .unwrap();
    assert_eq!(ids(&page), vec![f.paper1]);
}

// ============================================================================
// 6. Literals compare in their datatype, not as strings
// ============================================================================

#[tokio::test]
async fn test_typed_literal_comparison() {
    let f = fixture().await;
    // "2019" >= "10000" as strings, but not as integers
    let filter = SearchFilter::new(
        [f.method.clone(), f.year.clone()],
        id(classes::INTEGER),
        [FilterValue::new(Operator::Ge, "10000")],
        true,
    )
    .unwrap();
    let page = f
        .orkg
        .papers()
        .list_by_filters(None, &[filter], VisibilityFilter::AllListed, &PageRequest::default())
        .await
        .unwrap();
    assert!(page.is_empty());

    let wrong_range = SearchFilter::new(
        [f.method.clone(), f.year.clone()],
        id(classes::STRING),
        [FilterValue::equal_to("2019")],
        true,
    )
    .unwrap();
    let page = f
        .orkg
        .papers()
        .list_by_filters(None, &[wrong_range], VisibilityFilter::AllListed, &PageRequest::default())
        .await
        .unwrap();
    assert!(page.is_empty());
}

// ============================================================================
// 7. Visibility and observatory narrow the candidate papers
// ============================================================================

#[tokio::test]
async fn test_visibility_and_observatory() {
    let f = fixture().await;
    assert_eq!(listing(&f.orkg, VisibilityFilter::Featured).await, vec![f.paper1.clone()]);
    assert_eq!(
        listing(&f.orkg, VisibilityFilter::NonFeatured).await,
        sorted(vec![f.paper2.clone(), f.paper3.clone()])
    );
    assert!(listing(&f.orkg, VisibilityFilter::Unlisted).await.is_empty());

    let page = f
        .orkg
        .papers()
        .list_by_filters(Some(f.observatory), &[], VisibilityFilter::AllListed, &PageRequest::default())
        .await
        .unwrap();
    assert_eq!(ids(&page), vec![f.paper1.clone()]);

    let problems = f
        .orkg
        .research_problems()
        .list_by_observatory(f.observatory, &PageRequest::default())
        .await
        .unwrap();
    assert_eq!(ids(&problems), vec![f.problem1.clone()]);
}

// ============================================================================
// 8. Filters parsed from the JSON query parameter
// ============================================================================

#[tokio::test]
async fn test_parsed_filter_config() {
    let f = fixture().await;
    let json = format!(
        r#"[{{"path": ["{}", "{}"], "range": "Integer", "values": [{{"op": "LE", "value": "2019"}}], "exact": true}}]"#,
        f.method, f.year
    );
    let filters = parse_filters(&json).unwrap();
    let page = f
        .orkg
        .papers()
        .list_by_filters(None, &filters, VisibilityFilter::AllListed, &PageRequest::default())
        .await
        .unwrap();
    assert_eq!(ids(&page), vec![f.paper1]);
}

// ============================================================================
// 9. Invalid descriptors are rejected before searching
// ============================================================================

#[tokio::test]
async fn test_invalid_filters() {
    let f = fixture().await;
    let err = parse_filters(r#"[{"path": [], "range": "Resources", "values": [{"op": "EQ", "value": "R1"}]}]"#)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidPath { length: 0, max: 10 }));
    assert_eq!(err.status(), 400);

    let err = parse_filters(r#"[{"path": ["P32"], "range": "Resources", "values": [{"op": "LIKE", "value": "R1"}]}]"#)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidSearchFilter(_)));

    // descriptors built by hand are validated by the service too
    let mut filter = SearchFilter::new(
        [id(predicates::HAS_RESEARCH_PROBLEM)],
        id(classes::RESOURCES),
        [FilterValue::equal_to("R1")],
        true,
    )
    .unwrap();
    filter.path.clear();
    let err = f
        .orkg
        .papers()
        .list_by_filters(None, &[filter], VisibilityFilter::AllListed, &PageRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidPath { .. }));
}

// ============================================================================
// 10. Saved observatory filters take their values per search
// ============================================================================

#[tokio::test]
async fn test_saved_observatory_filter() {
    let f = fixture().await;
    let mut observatory = CreateObservatoryCommand::new("NLP");
    observatory.id = Some(f.observatory);
    f.orkg.observatories().create(observatory).await.unwrap();

    let saved = f
        .orkg
        .observatory_filters()
        .create(CreateObservatoryFilterCommand {
            id: None,
            observatory_id: f.observatory,
            label: "Method year".into(),
            contributor: ContributorId::random(),
            path: vec![f.method.clone(), f.year.clone()],
            range: id(classes::INTEGER),
            exact: true,
            featured: true,
        })
        .await
        .unwrap();

    let search = |values: Vec<FilterValue>| {
        let orkg = &f.orkg;
        async move {
            let page = orkg
                .observatory_filters()
                .papers(f.observatory, saved, values, VisibilityFilter::AllListed, &PageRequest::default())
                .await
                .unwrap();
            ids(&page)
        }
    };
    assert_eq!(search(vec![FilterValue::new(Operator::Le, "2019")]).await, vec![f.paper1.clone()]);
    // paper2 matches the value but belongs to no observatory
    assert!(search(vec![FilterValue::new(Operator::Gt, "2020")]).await.is_empty());

    let err = f
        .orkg
        .observatory_filters()
        .papers(f.observatory, saved, Vec::new(), VisibilityFilter::AllListed, &PageRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidSearchFilter(_)));
}
