//! End-to-end tests of the retention engine against an in-memory registry

mod common;

use common::{image, test_now, FakeRegistry};
use regprune_core::types::{ExclusionList, Image, Project};
use regprune_registry::RegistryApi;
use regprune_retention::{
    apply, classify, fetch_all, DeletionCandidate, FixedClock, ProjectSelector, PruneOptions,
    Pruner,
};
use std::sync::Arc;

fn pruner(fake: &FakeRegistry, exclusions: &[&str], dry_run: bool) -> Pruner {
    Pruner::new(
        Arc::new(fake.clone()),
        Arc::new(FixedClock(test_now())),
        PruneOptions {
            age_cutoff_days: 30,
            exclusions: ExclusionList::parse(exclusions).unwrap(),
            page_size: 100,
            max_images: None,
            dry_run,
        },
    )
}

fn scenario_images() -> Vec<Image> {
    vec![
        image("p1:latest", "d1", 40),
        image("p1:v1", "d1", 40),
        image("p1:v2", "d2", 5),
    ]
}

#[tokio::test]
async fn test_pagination_returns_every_item_in_order() {
    let images: Vec<Image> = (0..242)
        .map(|i| image(&format!("r/p1:v{}", i), &format!("sha256:{}", i), 60))
        .collect();
    let fake = FakeRegistry::new().with_images("p1", images.clone());

    let api: &dyn RegistryApi = &fake;
    let fetched = fetch_all(move |req| api.list_images("p1", req), 100, None)
        .await
        .unwrap();

    assert_eq!(fetched, images);
    let calls = fake.list_calls_for("p1");
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0].page_token, None);
    assert_eq!(calls[1].page_token.as_deref(), Some("100"));
    assert_eq!(calls[2].page_token.as_deref(), Some("200"));
}

#[tokio::test]
async fn test_end_to_end_confirmed_run() {
    let fake = FakeRegistry::new().with_images("p1", scenario_images());

    let summary = pruner(&fake, &["latest"], false)
        .run(&ProjectSelector::Single("p1".to_string()))
        .await
        .unwrap();

    assert_eq!(fake.delete_calls_for("p1"), vec![vec!["v1".to_string()]]);
    assert_eq!(summary.total_projects(), 1);
    assert_eq!(summary.total_success(), 1);
    assert_eq!(summary.total_errors(), 0);
    assert_eq!(summary.totals.digests_deleted, 0);
    assert_eq!(summary.projects[0].rescued_digests, 1);
}

#[tokio::test]
async fn test_dry_run_makes_no_delete_calls() {
    let fake = FakeRegistry::new().with_images("p1", scenario_images());

    let summary = pruner(&fake, &["latest"], true)
        .run(&ProjectSelector::Single("p1".to_string()))
        .await
        .unwrap();

    fake.assert_no_deletes();
    assert_eq!(summary.total_success(), 0);
    assert_eq!(summary.total_errors(), 0);
    assert_eq!(summary.planned_tags, 1);
    assert!(summary.has_pending_deletions());
}

#[tokio::test]
async fn test_apply_dry_run_is_a_hard_gate() {
    let fake = FakeRegistry::new();
    let candidates = vec![DeletionCandidate {
        display_tag: "v1".to_string(),
        digest: Some("sha256:a".to_string()),
    }];

    let outcome = apply(&fake, "p1", &candidates, &["sha256:a".to_string()], true).await;

    fake.assert_no_deletes();
    assert_eq!(outcome.success, 0);
    assert_eq!(outcome.errors, 0);
}

#[tokio::test]
async fn test_digests_never_deleted_without_tags() {
    let fake = FakeRegistry::new();
    let outcome = apply(&fake, "p1", &[], &["sha256:a".to_string()], false).await;
    fake.assert_no_deletes();
    assert_eq!(outcome.success, 0);
}

#[tokio::test]
async fn test_batch_isolates_failing_project() {
    let fake = FakeRegistry::new()
        .with_project(Project::new("p1").with_name("web"), vec![image("r/p1:old", "sha256:a", 90)])
        .with_project(Project::new("p2").with_name("api"), vec![image("r/p2:old", "sha256:b", 90)])
        .with_project(Project::new("p3"), vec![image("r/p3:old", "sha256:c", 90)])
        .fail_image_listing("p2");

    let summary = pruner(&fake, &[], false)
        .run(&ProjectSelector::All)
        .await
        .unwrap();

    assert_eq!(summary.total_projects(), 3);
    assert_eq!(summary.total_success(), 2);
    assert_eq!(summary.total_errors(), 0);

    let failed = &summary.projects[1];
    assert_eq!(failed.project.display_name(), "api");
    assert!(failed.error.as_deref().unwrap().contains("connection reset"));
    assert_eq!(failed.outcome.success, 0);
    assert_eq!(failed.outcome.errors, 0);

    assert_eq!(fake.delete_calls_for("p1").len(), 2);
    assert!(fake.delete_calls_for("p2").is_empty());
    assert_eq!(fake.delete_calls_for("p3").len(), 2);
}

#[tokio::test]
async fn test_project_directory_failure_aborts_run() {
    let fake = FakeRegistry::new()
        .with_project(Project::new("p1"), vec![image("r/p1:old", "sha256:a", 90)])
        .fail_project_listing();

    let result = pruner(&fake, &[], false).run(&ProjectSelector::All).await;

    assert!(result.is_err());
    fake.assert_no_deletes();
}

#[tokio::test]
async fn test_tag_failure_still_attempts_digests() {
    let fake = FakeRegistry::new()
        .with_images("p1", vec![image("r/p1:old", "sha256:aaa", 90)])
        .fail_delete_call("p1", 0);

    let summary = pruner(&fake, &[], false)
        .run(&ProjectSelector::Single("p1".to_string()))
        .await
        .unwrap();

    assert_eq!(
        fake.delete_calls_for("p1"),
        vec![vec!["old".to_string()], vec!["sha256-aaa".to_string()]]
    );
    assert_eq!(summary.total_success(), 0);
    assert_eq!(summary.total_errors(), 1);
    assert_eq!(summary.totals.digests_deleted, 1);
}

#[tokio::test]
async fn test_digest_failure_is_not_an_error() {
    let fake = FakeRegistry::new()
        .with_images("p1", vec![image("r/p1:old", "sha256:aaa", 90)])
        .fail_delete_call("p1", 1);

    let summary = pruner(&fake, &[], false)
        .run(&ProjectSelector::Single("p1".to_string()))
        .await
        .unwrap();

    assert_eq!(summary.total_success(), 1);
    assert_eq!(summary.total_errors(), 0);
    assert_eq!(summary.totals.digests_deleted, 0);
}

#[tokio::test]
async fn test_project_scoped_exclusion_only_applies_to_its_project() {
    let fake = FakeRegistry::new()
        .with_project(Project::new("p1"), vec![image("r/p1:staging", "sha256:a", 90)])
        .with_project(Project::new("p2"), vec![image("r/p2:staging", "sha256:b", 90)]);

    pruner(&fake, &["p1:staging"], false)
        .run(&ProjectSelector::All)
        .await
        .unwrap();

    assert!(fake.delete_calls_for("p1").is_empty());
    assert_eq!(fake.delete_calls_for("p2")[0], vec!["staging".to_string()]);
}

#[tokio::test]
async fn test_empty_project_is_not_an_error() {
    let fake = FakeRegistry::new().with_images("p1", Vec::new());

    let summary = pruner(&fake, &[], false)
        .run(&ProjectSelector::Single("p1".to_string()))
        .await
        .unwrap();

    assert_eq!(summary.total_projects(), 1);
    assert_eq!(summary.projects[0].images, 0);
    assert!(summary.projects[0].error.is_none());
    fake.assert_no_deletes();
}

#[tokio::test]
async fn test_empty_directory_is_not_an_error() {
    let fake = FakeRegistry::new();
    let summary = pruner(&fake, &[], false)
        .run(&ProjectSelector::All)
        .await
        .unwrap();
    assert_eq!(summary.total_projects(), 0);
}

#[tokio::test]
async fn test_max_images_limits_listing() {
    let images: Vec<Image> = (0..50)
        .map(|i| image(&format!("r/p1:v{}", i), &format!("sha256:{}", i), 90))
        .collect();
    let fake = FakeRegistry::new().with_images("p1", images);

    let pruner = Pruner::new(
        Arc::new(fake.clone()),
        Arc::new(FixedClock(test_now())),
        PruneOptions {
            page_size: 20,
            max_images: Some(25),
            ..PruneOptions::default()
        },
    );
    let summary = pruner
        .run(&ProjectSelector::Single("p1".to_string()))
        .await
        .unwrap();

    assert_eq!(summary.projects[0].images, 25);
    let sizes: Vec<u32> = fake
        .list_calls_for("p1")
        .iter()
        .map(|r| r.page_size)
        .collect();
    assert_eq!(sizes, vec![20, 5]);
}

fn capped_pruner(fake: &FakeRegistry, max_images: usize) -> Pruner {
    Pruner::new(
        Arc::new(fake.clone()),
        Arc::new(FixedClock(test_now())),
        PruneOptions {
            max_images: Some(max_images),
            dry_run: false,
            ..PruneOptions::default()
        },
    )
}

#[tokio::test]
async fn test_truncated_listing_withholds_digests() {
    let fake = FakeRegistry::new().with_images(
        "p1",
        vec![
            image("r/p1:old", "sha256:shared", 90),
            image("r/p1:new", "sha256:shared", 1),
        ],
    );

    let summary = capped_pruner(&fake, 1)
        .run(&ProjectSelector::Single("p1".to_string()))
        .await
        .unwrap();

    assert_eq!(fake.delete_calls_for("p1"), vec![vec!["old".to_string()]]);
    let report = &summary.projects[0];
    assert!(report.listing_truncated);
    assert_eq!(report.planned_digests, 0);
    assert_eq!(report.outcome.success, 1);
    assert_eq!(report.outcome.digests_deleted, 0);
}

#[tokio::test]
async fn test_limit_covering_every_image_still_deletes_digests() {
    let fake = FakeRegistry::new().with_images(
        "p1",
        vec![
            image("r/p1:old", "sha256:gone", 90),
            image("r/p1:new", "sha256:live", 1),
        ],
    );

    let summary = capped_pruner(&fake, 2)
        .run(&ProjectSelector::Single("p1".to_string()))
        .await
        .unwrap();

    assert!(!summary.projects[0].listing_truncated);
    assert_eq!(
        fake.delete_calls_for("p1"),
        vec![vec!["old".to_string()], vec!["sha256-gone".to_string()]]
    );
}

#[test]
fn test_digest_safety_across_keep_reasons() {
    let mut undated = Image::tagged("r/p1:undated").with_digest("sha256:undated");
    undated.pushed_at = None;

    let images = vec![
        image("r/p1:a-old", "sha256:excluded", 90),
        image("r/p1:latest", "sha256:excluded", 90),
        image("r/p1:b-old", "sha256:recent", 90),
        image("r/p1:b-new", "sha256:recent", 1),
        image("r/p1:c-old", "sha256:undated", 90),
        undated,
        image("r/p1:d-old", "sha256:gone", 90),
        image("r/p1:d-older", "sha256:gone", 120),
    ];
    let exclusions = ExclusionList::parse(&["latest"]).unwrap();

    let decision = classify(&images, 30, "p1", &exclusions, test_now());

    assert_eq!(decision.images_to_delete.len(), 5);
    assert_eq!(decision.safe_digests, vec!["sha256:gone".to_string()]);
    assert_eq!(decision.rescued_digests, 3);
}
