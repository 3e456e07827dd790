use serde::Deserialize;

/// Options recognized by the [`App`](crate::app::App) controller.
///
/// This implements [`Default`] and follows the builder pattern:
/// ```rust
/// # use surfnav::AppConfig;
/// let cfg = AppConfig::default()
///     .base_path("/app")
///     .default_title("My app")
///     .update_scroll_position(false);
/// assert_eq!(cfg.loading_css_class, "surfnav-loading");
/// ```
///
/// It can also be deserialized, with every field optional:
/// ```rust
/// # use surfnav::AppConfig;
/// let cfg: AppConfig = serde_json::from_str(r#"{ "basePath": "/app" }"#).unwrap();
/// assert_eq!(cfg.base_path, "/app");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    /// Prefix shared by every path the app routes. Links outside it are not intercepted.
    pub base_path: String,

    /// Selector for links whose activation is intercepted.
    pub link_selector: String,

    /// Selector for forms whose submission is intercepted.
    pub form_selector: String,

    /// Class set on the document element while a navigation is running.
    pub loading_css_class: String,

    /// Title used when the active screen has none.
    pub default_title: String,

    /// When `true` the controller restores scroll positions itself: the recorded position on
    /// traversal and the top of the page for new navigations. When `false` the browser takes
    /// care of it.
    pub update_scroll_position: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_path: String::new(),
            link_selector: "a:not([data-surfnav-off])".to_string(),
            form_selector: r#"form[enctype="multipart/form-data"]:not([data-surfnav-off])"#
                .to_string(),
            loading_css_class: "surfnav-loading".to_string(),
            default_title: String::new(),
            update_scroll_position: true,
        }
    }
}

impl AppConfig {
    pub fn base_path(self, base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            ..self
        }
    }

    pub fn link_selector(self, link_selector: impl Into<String>) -> Self {
        Self {
            link_selector: link_selector.into(),
            ..self
        }
    }

    pub fn form_selector(self, form_selector: impl Into<String>) -> Self {
        Self {
            form_selector: form_selector.into(),
            ..self
        }
    }

    pub fn loading_css_class(self, loading_css_class: impl Into<String>) -> Self {
        Self {
            loading_css_class: loading_css_class.into(),
            ..self
        }
    }

    pub fn default_title(self, default_title: impl Into<String>) -> Self {
        Self {
            default_title: default_title.into(),
            ..self
        }
    }

    pub fn update_scroll_position(self, update_scroll_position: bool) -> Self {
        Self {
            update_scroll_position,
            ..self
        }
    }
}
