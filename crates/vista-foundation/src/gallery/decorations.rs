//! Gallery-wide layout parameters and their resolved form.

use std::rc::Rc;

use vista_core::{Expression, ResolutionError, ResolverRef, SubscriptionScope};

pub const DEFAULT_ITEM_SPACING_DP: i64 = 8;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Orientation {
    #[default]
    Horizontal,
    Vertical,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScrollMode {
    #[default]
    Default,
    /// Snap to item starts.
    Paging,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Scrollbar {
    #[default]
    None,
    Auto,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GalleryLayout {
    #[default]
    Linear,
    Grid {
        columns: usize,
    },
}

/// Resolved decorations, in pixels.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GalleryDecorations {
    pub orientation: Orientation,
    pub horizontal_scrollbar: bool,
    pub vertical_scrollbar: bool,
    pub layout: GalleryLayout,
    pub item_spacing_px: i32,
    /// Zero for single-column layouts.
    pub cross_spacing_px: i32,
    pub scroll_mode: ScrollMode,
    pub restrict_parent_scroll: bool,
}

/// Expression-valued gallery parameters.
#[derive(Clone, Debug)]
pub struct GalleryParams {
    pub orientation: Expression,
    pub scrollbar: Expression,
    pub scroll_mode: Expression,
    pub item_spacing: Expression,
    pub cross_spacing: Option<Expression>,
    pub column_count: Option<Expression>,
    pub restrict_parent_scroll: Expression,
    pub default_item: Expression,
}

impl Default for GalleryParams {
    fn default() -> Self {
        Self {
            orientation: Expression::constant("horizontal"),
            scrollbar: Expression::constant("none"),
            scroll_mode: Expression::constant("default"),
            item_spacing: Expression::constant(DEFAULT_ITEM_SPACING_DP),
            cross_spacing: None,
            column_count: None,
            restrict_parent_scroll: Expression::constant(false),
            default_item: Expression::constant(0),
        }
    }
}

impl GalleryParams {
    pub fn orientation(mut self, orientation: Expression) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn scrollbar(mut self, scrollbar: Expression) -> Self {
        self.scrollbar = scrollbar;
        self
    }

    pub fn scroll_mode(mut self, scroll_mode: Expression) -> Self {
        self.scroll_mode = scroll_mode;
        self
    }

    pub fn item_spacing(mut self, item_spacing: Expression) -> Self {
        self.item_spacing = item_spacing;
        self
    }

    pub fn cross_spacing(mut self, cross_spacing: Expression) -> Self {
        self.cross_spacing = Some(cross_spacing);
        self
    }

    pub fn column_count(mut self, column_count: Expression) -> Self {
        self.column_count = Some(column_count);
        self
    }

    pub fn restrict_parent_scroll(mut self, restrict: Expression) -> Self {
        self.restrict_parent_scroll = restrict;
        self
    }

    pub fn default_item(mut self, default_item: Expression) -> Self {
        self.default_item = default_item;
        self
    }

    pub fn resolve(
        &self,
        context: &ResolverRef,
        density: f32,
    ) -> Result<GalleryDecorations, ResolutionError> {
        let orientation = match context.evaluate_string(&self.orientation)?.as_ref() {
            "horizontal" => Orientation::Horizontal,
            "vertical" => Orientation::Vertical,
            other => return Err(unknown(&self.orientation, "orientation", other)),
        };
        let scrollbar = match context.evaluate_string(&self.scrollbar)?.as_ref() {
            "none" => Scrollbar::None,
            "auto" => Scrollbar::Auto,
            other => return Err(unknown(&self.scrollbar, "scrollbar", other)),
        };
        let scroll_mode = match context.evaluate_string(&self.scroll_mode)?.as_ref() {
            "default" => ScrollMode::Default,
            "paging" => ScrollMode::Paging,
            other => return Err(unknown(&self.scroll_mode, "scroll mode", other)),
        };

        let columns = match &self.column_count {
            Some(expression) => context.evaluate_integer(expression)?.max(1) as usize,
            None => 1,
        };
        let item_spacing = context.evaluate_integer(&self.item_spacing)?;
        let cross_spacing = if columns == 1 {
            0
        } else {
            let expression = self.cross_spacing.as_ref().unwrap_or(&self.item_spacing);
            dp_to_px(context.evaluate_integer(expression)?, density)
        };

        let scrollbars = scrollbar == Scrollbar::Auto;
        Ok(GalleryDecorations {
            orientation,
            horizontal_scrollbar: scrollbars && orientation == Orientation::Horizontal,
            vertical_scrollbar: scrollbars && orientation == Orientation::Vertical,
            layout: if columns == 1 {
                GalleryLayout::Linear
            } else {
                GalleryLayout::Grid { columns }
            },
            item_spacing_px: dp_to_px(item_spacing, density),
            cross_spacing_px: cross_spacing,
            scroll_mode,
            restrict_parent_scroll: context.evaluate_bool(&self.restrict_parent_scroll)?,
        })
    }

    /// Initial item when no scroll state is stored. Negative values clamp to 0.
    pub fn default_item_index(&self, context: &ResolverRef) -> Result<usize, ResolutionError> {
        Ok(context.evaluate_integer(&self.default_item)?.max(0) as usize)
    }

    /// Subscribes `callback` to every parameter.
    pub fn subscribe(&self, context: &ResolverRef, callback: Rc<dyn Fn()>) -> SubscriptionScope {
        let mut scope = SubscriptionScope::new();
        let expressions = [
            Some(&self.orientation),
            Some(&self.scrollbar),
            Some(&self.scroll_mode),
            Some(&self.item_spacing),
            self.cross_spacing.as_ref(),
            self.column_count.as_ref(),
            Some(&self.restrict_parent_scroll),
        ];
        for expression in expressions.into_iter().flatten() {
            scope.observe(context, expression, callback.clone());
        }
        scope
    }
}

fn unknown(expression: &Expression, what: &str, value: &str) -> ResolutionError {
    ResolutionError::evaluation(expression.to_string(), format!("unknown {what} '{value}'"))
}

pub fn dp_to_px(dp: i64, density: f32) -> i32 {
    (dp as f32 * density).round() as i32
}
