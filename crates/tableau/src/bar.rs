//! Toolbar, navigation bar and pull-to-refresh commands.

use crate::command::{Command, CommandOption};
use crate::error::BindResult;
use crate::member::{MemberDef, derive_caption};
use crate::object::ObjectRef;

/// Where a bar button sits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BarPlacement {
    /// Leading edge.
    Left,
    /// Centered between flexible spaces.
    Center,
    /// Trailing edge.
    #[default]
    Right,
}

/// Button directive shared by row, toolbar and navbar buttons.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ButtonOptions {
    /// Caption override.
    pub caption: Option<String>,
    /// Bar placement.
    pub placement: BarPlacement,
    /// Position among buttons with the same placement.
    pub order: i32,
    /// Bool member gating the command.
    pub can_execute: Option<String>,
    /// Policy when the gate is false.
    pub option: CommandOption,
}

impl ButtonOptions {
    /// Default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Caption override.
    pub fn caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    /// Bar placement.
    pub fn placement(mut self, placement: BarPlacement) -> Self {
        self.placement = placement;
        self
    }

    /// Position among siblings.
    pub fn order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    /// Gate the command on a bool member.
    pub fn can_execute(mut self, member: impl Into<String>) -> Self {
        self.can_execute = Some(member.into());
        self
    }

    /// Hide the button instead of disabling it when the gate is false.
    pub fn hide_when_disabled(mut self) -> Self {
        self.option = CommandOption::Hide;
        self
    }
}

/// A button bound to a command.
#[derive(Debug, Clone)]
pub struct BarButton {
    /// Caption.
    pub caption: String,
    /// Placement.
    pub placement: BarPlacement,
    /// Order among siblings.
    pub order: i32,
    /// Bound command.
    pub command: Command,
}

impl BarButton {
    pub(crate) fn bind(target: &ObjectRef, def: &MemberDef, options: &ButtonOptions) -> BindResult<Self> {
        Ok(Self {
            caption: options
                .caption
                .clone()
                .or_else(|| def.attrs().caption.clone())
                .unwrap_or_else(|| derive_caption(def.name())),
            placement: options.placement,
            order: options.order,
            command: Command::from_button(target, def.name(), options)?,
        })
    }
}

/// One toolbar slot.
#[derive(Debug, Clone)]
pub enum BarItem {
    /// A button.
    Button(BarButton),
    /// Stretchable space.
    FlexibleSpace,
}

impl BarItem {
    /// The button in this slot, if any.
    pub fn as_button(&self) -> Option<&BarButton> {
        match self {
            Self::Button(button) => Some(button),
            Self::FlexibleSpace => None,
        }
    }
}

/// Lay out toolbar buttons: left buttons, then centered buttons between
/// flexible spaces, then right buttons. Each group is sorted by order.
pub fn layout_toolbar(buttons: Vec<BarButton>) -> Vec<BarItem> {
    let (mut left, mut center, mut right) = (Vec::new(), Vec::new(), Vec::new());
    for button in buttons {
        match button.placement {
            BarPlacement::Left => left.push(button),
            BarPlacement::Center => center.push(button),
            BarPlacement::Right => right.push(button),
        }
    }
    for group in [&mut left, &mut center, &mut right] {
        group.sort_by_key(|b| b.order);
    }

    let mut items: Vec<BarItem> = left.into_iter().map(BarItem::Button).collect();
    if !center.is_empty() {
        items.push(BarItem::FlexibleSpace);
        items.extend(center.into_iter().map(BarItem::Button));
        items.push(BarItem::FlexibleSpace);
    } else if !right.is_empty() {
        items.push(BarItem::FlexibleSpace);
    }
    items.extend(right.into_iter().map(BarItem::Button));
    items
}

/// Navigation bar buttons, split by side.
#[derive(Debug, Clone, Default)]
pub struct NavbarButtons {
    /// Leading buttons, by order.
    pub left: Vec<BarButton>,
    /// Trailing buttons, by order. Centered buttons land here too.
    pub right: Vec<BarButton>,
}

impl NavbarButtons {
    pub(crate) fn from_buttons(buttons: Vec<BarButton>) -> Self {
        let (mut left, mut right): (Vec<_>, Vec<_>) = buttons
            .into_iter()
            .partition(|b| b.placement == BarPlacement::Left);
        left.sort_by_key(|b| b.order);
        right.sort_by_key(|b| b.order);
        Self { left, right }
    }

    /// Whether there are no buttons.
    pub fn is_empty(&self) -> bool {
        self.left.is_empty() && self.right.is_empty()
    }
}

/// The screen's refresh command.
#[derive(Debug, Clone)]
pub struct PullToRefresh {
    /// Key under which the surface stores the last refresh time.
    pub settings_key: String,
    /// Refresh command.
    pub command: Command,
}
