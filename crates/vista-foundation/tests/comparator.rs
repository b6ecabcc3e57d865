use std::rc::Rc;

use vista_core::{Expression, ExpressionResolver, ResolverRef, Value};
use vista_foundation::{
    is_replaceable, resolved_shape, DescriptorNode, ItemBuilder, ItemDescriptor, Prototype,
};
use vista_testing::{card, TestResolver};

fn rows(count: i64) -> Value {
    Value::array((0..count).map(Value::from))
}

fn list_node() -> DescriptorNode {
    DescriptorNode::new("list").children_builder(
        ItemBuilder::new(Expression::variable("rows"))
            .prototype(Prototype::new(DescriptorNode::new("row").property("n", Expression::variable("it")))),
    )
}

#[test]
fn every_descriptor_is_replaceable_with_itself() {
    let resolver = TestResolver::new();
    resolver.set_variable("rows", rows(3));
    let context = resolver.context();

    let nodes = [
        card("a", Expression::constant("A")),
        DescriptorNode::new("container")
            .structural("layout", Expression::constant("row"))
            .child(card("x", Expression::constant("X")))
            .child(DescriptorNode::new("image").property("url", Expression::variable("missing"))),
        list_node(),
        DescriptorNode::new("text").structural("style", Expression::variable("missing")),
    ];
    for node in &nodes {
        assert!(is_replaceable(node, node, &context, &context), "{node:?}");
    }
}

#[test]
fn leaf_differences_are_replaceable() {
    let resolver = TestResolver::new();
    let context = resolver.context();
    let old = card("a", Expression::constant("old"));
    let new = card("a", Expression::variable("title"));
    assert!(is_replaceable(&old, &new, &context, &context));
}

#[test]
fn kind_and_id_changes_require_a_rebuild() {
    let resolver = TestResolver::new();
    let context = resolver.context();
    let text = DescriptorNode::new("text");
    let image = DescriptorNode::new("image");
    assert!(!is_replaceable(&text, &image, &context, &context));

    let a = card("a", Expression::constant("A"));
    let b = card("b", Expression::constant("A"));
    assert!(!is_replaceable(&a, &b, &context, &context));

    let anonymous = DescriptorNode::new("card").property("title", Expression::constant("A"));
    assert!(is_replaceable(&a, &anonymous, &context, &context));
}

#[test]
fn structural_fields_resolve_in_each_side_context() {
    let resolver = TestResolver::new();
    let root = resolver.context();
    let bold = root.scoped("style", Value::from("bold"));
    let italic = root.scoped("style", Value::from("italic"));
    let also_bold = root.scoped("style", Value::from("bold"));

    let node = DescriptorNode::new("text").structural("style", Expression::variable("style"));
    assert!(is_replaceable(&node, &node, &bold, &also_bold));
    assert!(!is_replaceable(&node, &node, &bold, &italic));

    let items_bold = ItemDescriptor::new(Rc::new(node.clone()), bold);
    let items_italic = ItemDescriptor::new(Rc::new(node), italic);
    assert!(!items_bold.is_replaceable_with(&items_italic));
}

#[test]
fn one_failed_structural_field_differs() {
    let resolver = TestResolver::new();
    let root = resolver.context();
    let with_style: ResolverRef = root.scoped("style", Value::from("bold"));
    let node = DescriptorNode::new("text").structural("style", Expression::variable("style"));
    assert!(!is_replaceable(&node, &node, &with_style, &root));
    assert!(is_replaceable(&node, &node, &root, &root.scoped("other", Value::Null)));
}

#[test]
fn child_count_is_structural() {
    let resolver = TestResolver::new();
    let context = resolver.context();
    let one = DescriptorNode::new("container").child(DescriptorNode::new("text"));
    let two = DescriptorNode::new("container")
        .child(DescriptorNode::new("text"))
        .child(DescriptorNode::new("text"));
    assert!(!is_replaceable(&one, &two, &context, &context));

    let different_child = DescriptorNode::new("container").child(DescriptorNode::new("image"));
    assert!(!is_replaceable(&one, &different_child, &context, &context));
}

#[test]
fn builder_children_expand_per_context() {
    let resolver = TestResolver::new();
    let root = resolver.context();
    let three = root.scoped("rows", rows(3));
    let other_three = root.scoped("rows", rows(3));
    let four = root.scoped("rows", rows(4));

    let node = list_node();
    assert!(is_replaceable(&node, &node, &three, &other_three));
    assert!(!is_replaceable(&node, &node, &three, &four));

    let fixed = DescriptorNode::new("list")
        .child(DescriptorNode::new("row"))
        .child(DescriptorNode::new("row"))
        .child(DescriptorNode::new("row"));
    assert!(is_replaceable(&node, &fixed, &three, &root));
}

#[test]
fn resolved_shape_follows_structure_not_leaves_or_root_id() {
    let resolver = TestResolver::new();
    resolver.set_variable("style", "plain");
    resolver.set_variable("rows", rows(2));
    let context = resolver.context();
    let styled = |id: &str, title: &str| {
        card(id, Expression::constant(title)).structural("style", Expression::variable("style"))
    };

    let plain = resolved_shape(&styled("a", "A"), &context);
    assert_eq!(plain, resolved_shape(&styled("b", "B"), &context));

    resolver.set_variable("style", "bold");
    assert_ne!(plain, resolved_shape(&styled("a", "A"), &context));

    let two_rows = resolved_shape(&list_node(), &context);
    resolver.set_variable("rows", rows(3));
    assert_ne!(two_rows, resolved_shape(&list_node(), &context));
}
