use std::rc::Rc;

use vista_core::{Expression, ResolutionError};
use vista_foundation::{
    Gallery, GalleryConfig, GalleryDecorations, GalleryLayout, GalleryParams, Orientation,
    ScrollMode,
};
use vista_testing::{cards, GalleryTestRule, TestResolver};

#[test]
fn defaults_resolve_to_a_plain_horizontal_list() {
    let resolver = TestResolver::new();
    let decorations = GalleryParams::default()
        .resolve(&resolver.context(), 1.0)
        .unwrap();
    assert_eq!(
        decorations,
        GalleryDecorations {
            item_spacing_px: 8,
            ..GalleryDecorations::default()
        }
    );
}

#[test]
fn automatic_scrollbar_follows_orientation() {
    let resolver = TestResolver::new();
    let decorations = GalleryParams::default()
        .orientation(Expression::constant("vertical"))
        .scrollbar(Expression::constant("auto"))
        .scroll_mode(Expression::constant("paging"))
        .resolve(&resolver.context(), 1.0)
        .unwrap();
    assert_eq!(decorations.orientation, Orientation::Vertical);
    assert!(decorations.vertical_scrollbar);
    assert!(!decorations.horizontal_scrollbar);
    assert_eq!(decorations.scroll_mode, ScrollMode::Paging);
}

#[test]
fn grid_spacing_scales_with_density() {
    let resolver = TestResolver::new();
    let params = GalleryParams::default()
        .column_count(Expression::constant(3))
        .item_spacing(Expression::constant(4))
        .cross_spacing(Expression::constant(6));
    let decorations = params.resolve(&resolver.context(), 2.0).unwrap();
    assert_eq!(decorations.layout, GalleryLayout::Grid { columns: 3 });
    assert_eq!(decorations.item_spacing_px, 8);
    assert_eq!(decorations.cross_spacing_px, 12);

    // Cross spacing falls back to item spacing when unset.
    let decorations = GalleryParams::default()
        .column_count(Expression::constant(2))
        .resolve(&resolver.context(), 1.5)
        .unwrap();
    assert_eq!(decorations.cross_spacing_px, 12);
}

#[test]
fn single_column_has_no_cross_spacing() {
    let resolver = TestResolver::new();
    let decorations = GalleryParams::default()
        .column_count(Expression::constant(0))
        .cross_spacing(Expression::constant(6))
        .resolve(&resolver.context(), 1.0)
        .unwrap();
    assert_eq!(decorations.layout, GalleryLayout::Linear);
    assert_eq!(decorations.cross_spacing_px, 0);
}

#[test]
fn unknown_orientation_is_an_evaluation_error() {
    let resolver = TestResolver::new();
    let err = GalleryParams::default()
        .orientation(Expression::constant("diagonal"))
        .resolve(&resolver.context(), 1.0)
        .unwrap_err();
    match err {
        ResolutionError::Evaluation { reason, .. } => {
            assert_eq!(reason, "unknown orientation 'diagonal'")
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn negative_default_item_clamps_to_zero() {
    let resolver = TestResolver::new();
    let params = GalleryParams::default().default_item(Expression::constant(-3));
    assert_eq!(params.default_item_index(&resolver.context()), Ok(0));
}

#[test]
fn bound_gallery_reapplies_changed_decorations() {
    let mut rule = GalleryTestRule::with_config(GalleryConfig::default().with_density(2.0));
    rule.resolver().set_variable("orientation", "horizontal");
    let gallery = Gallery::new(cards(&["a", "b"]))
        .with_id("g")
        .with_params(GalleryParams::default().orientation(Expression::variable("orientation")));
    rule.bind(Rc::new(gallery)).unwrap();
    assert_eq!(rule.toolkit().decoration_updates(), 1);
    assert_eq!(
        rule.toolkit().decorations().map(|d| d.item_spacing_px),
        Some(16)
    );

    rule.resolver().set_variable("orientation", "vertical");
    assert!(rule.adapter().has_pending_work());
    let report = rule.flush().unwrap();
    assert!(report.is_noop());
    assert_eq!(rule.toolkit().decoration_updates(), 2);
    assert_eq!(
        rule.adapter().decorations().map(|d| d.orientation),
        Some(Orientation::Vertical)
    );

    // Same value again: resolved decorations are equal, nothing is pushed.
    rule.resolver().set_variable("orientation", "vertical");
    rule.flush().unwrap();
    assert_eq!(rule.toolkit().decoration_updates(), 2);
}
