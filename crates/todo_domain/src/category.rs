use serde::{Deserialize, Serialize};

use crate::task::generate_id;

pub const DEFAULT_CATEGORY_ICON: &str = "📁";
pub const DEFAULT_CATEGORY_COLOR: &str = "#C7CEEA";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default = "default_icon")]
    pub icon: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub order: u32,
}

fn default_icon() -> String {
    DEFAULT_CATEGORY_ICON.to_string()
}

fn default_color() -> String {
    DEFAULT_CATEGORY_COLOR.to_string()
}

impl Category {
    pub fn new(name: impl Into<String>, order: u32) -> Self {
        Self {
            id: generate_id("cat"),
            name: name.into(),
            icon: default_icon(),
            color: default_color(),
            order,
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }
}

/// The set a fresh workspace starts with.
pub fn default_categories() -> Vec<Category> {
    [
        ("Work", "💼", "#3B82F6"),
        ("Study", "📚", "#8B5CF6"),
        ("Life", "🏠", "#10B981"),
        ("Other", "📌", "#6B7280"),
    ]
    .into_iter()
    .zip(0..)
    .map(|((name, icon, color), order)| {
        Category::new(name, order).with_icon(icon).with_color(color)
    })
    .collect()
}

/// Partial update; `None` leaves a field as it is.
#[derive(Debug, Clone, Default)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
}

impl CategoryUpdate {
    /// A blank name is ignored rather than applied.
    pub fn apply(self, category: &mut Category) {
        if let Some(name) = self.name {
            let name = name.trim();
            if !name.is_empty() {
                category.name = name.to_string();
            }
        }
        if let Some(icon) = self.icon {
            category.icon = icon;
        }
        if let Some(color) = self.color {
            category.color = color;
        }
    }
}
