use flowscribe_config::ExtractionConfig;
use flowscribe_testkit::{FakeRenderer, FakeWorkflow, step_box};

use super::*;
use crate::geometry::CanvasBand;

fn element(id: i64, text: &str, bbox: BoundingBox) -> RenderedElement {
    RenderedElement {
        handle: ElementHandle::new(id),
        text: text.to_string(),
        bounding_box: Some(bbox),
    }
}

fn on_canvas(y: f64) -> BoundingBox {
    BoundingBox::new(400.0, y, 200.0, 50.0)
}

#[test]
fn test_step_number() {
    assert_eq!(step_number("Step 3: Create a thing"), Some(3));
    assert_eq!(step_number("  Step 10\nDelete"), Some(10));
    assert_eq!(step_number("Create a thing"), None);
    assert_eq!(step_number("Next Step 3"), None);
}

#[test]
fn test_locate_sorts_by_order() {
    let snapshot = RenderSnapshot::new(vec![
        element(1, "Step 3: Send email", on_canvas(300.0)),
        element(2, "Step 1: Create a new thing", on_canvas(100.0)),
        element(3, "Step 2: Only when condition", on_canvas(200.0)),
    ]);

    let candidates = locate(&snapshot, &CanvasBand::new(250.0));
    let orders: Vec<u32> = candidates.iter().map(|c| c.order).collect();
    assert_eq!(orders, vec![1, 2, 3]);
    assert_eq!(candidates[0].title, "Create a new thing");
}

#[test]
fn test_locate_nested_duplicate_collapses() {
    let outer = on_canvas(300.0);
    let inner = BoundingBox::new(410.0, 305.0, 180.0, 40.0);
    let snapshot = RenderSnapshot::new(vec![
        element(10, "Step 3: Create a thing", outer),
        element(11, "Step 3: Create a thing", inner),
    ]);

    let candidates = locate(&snapshot, &CanvasBand::new(250.0));
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].order, 3);
    assert_eq!(candidates[0].handle, ElementHandle::new(10));
    assert_eq!(candidates[0].bounding_box, outer);
}

#[test]
fn test_locate_same_text_different_order_is_distinct() {
    let snapshot = RenderSnapshot::new(vec![
        element(1, "Step 1: Send email", on_canvas(100.0)),
        element(2, "Step 2: Send email", on_canvas(200.0)),
    ]);
    assert_eq!(locate(&snapshot, &CanvasBand::new(250.0)).len(), 2);
}

#[test]
fn test_locate_off_canvas_duplicate_does_not_claim_order() {
    let snapshot = RenderSnapshot::new(vec![
        element(1, "Step 2: Sidebar preview", BoundingBox::new(20.0, 50.0, 200.0, 30.0)),
        element(2, "Step 2: Delete thing", on_canvas(200.0)),
    ]);

    let candidates = locate(&snapshot, &CanvasBand::new(250.0));
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].title, "Delete thing");
}

#[test]
fn test_locate_skips_zero_area_and_unboxed() {
    let mut unboxed = element(3, "Step 3: Send email", on_canvas(300.0));
    unboxed.bounding_box = None;
    let snapshot = RenderSnapshot::new(vec![
        element(1, "Step 1: Create a new thing", BoundingBox::new(400.0, 100.0, 0.0, 50.0)),
        element(2, "Step 2: Only when", on_canvas(200.0)),
        unboxed,
    ]);

    let orders: Vec<u32> = locate(&snapshot, &CanvasBand::new(250.0))
        .iter()
        .map(|c| c.order)
        .collect();
    assert_eq!(orders, vec![2]);
}

#[test]
fn test_locate_empty_is_not_an_error() {
    let snapshot = RenderSnapshot::new(vec![element(1, "Workflows", on_canvas(10.0))]);
    assert!(locate(&snapshot, &CanvasBand::new(250.0)).is_empty());
    assert!(locate(&RenderSnapshot::default(), &CanvasBand::new(250.0)).is_empty());
}

#[tokio::test]
async fn test_step_locator_reads_renderer() {
    let config = ExtractionConfig::default();
    let renderer = FakeRenderer::new(&config).with_workflow(
        FakeWorkflow::new("send-welcome")
            .step(2, "Only when condition", "")
            .step(1, "Create a new thing", "")
            .element("Step 1: Create a new thing", step_box(1))
            .unboxed_element("Step 9: hidden"),
    );
    let nav = renderer
        .query_all(&ElementQuery::css(config.selectors.nav_item.clone()))
        .await
        .unwrap();
    renderer.click_element(&nav[0]).await.unwrap();

    let locator = StepLocator::new(&config.selectors, Box::new(CanvasBand::from(&config.canvas)));
    let candidates = locator.locate_on(&renderer).await.unwrap();

    let orders: Vec<u32> = candidates.iter().map(|c| c.order).collect();
    assert_eq!(orders, vec![1, 2]);
}

#[tokio::test]
async fn test_step_locator_propagates_fatal_errors() {
    let config = ExtractionConfig::default();
    let renderer = FakeRenderer::new(&config)
        .with_workflow(FakeWorkflow::new("doomed"))
        .fatal_on_select("doomed");
    let nav = renderer
        .query_all(&ElementQuery::css(config.selectors.nav_item.clone()))
        .await
        .unwrap();
    assert!(renderer.click_element(&nav[0]).await.is_err());

    let locator = StepLocator::new(&config.selectors, Box::new(CanvasBand::from(&config.canvas)));
    let err = locator.locate_on(&renderer).await.unwrap_err();
    assert!(err.is_fatal());
}
