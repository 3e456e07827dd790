//! Surfaces: the DOM regions whose content is swapped on navigation.

use std::{
    cell::RefCell,
    collections::HashMap,
    fmt,
    rc::Rc,
};

use crate::screen::{Content, ScreenId};

/// Renders the content of a [`Surface`].
pub trait SurfaceView {
    /// Make `content` the visible content of the region.
    fn show(&self, screen_id: ScreenId, content: Option<&str>);

    /// The content stored for `screen_id` was evicted.
    #[allow(unused_variables)]
    fn remove(&self, screen_id: ScreenId) {}
}

/// One addressable region of the page.
///
/// A surface keeps the content every screen rendered into it, keyed by screen id, until the
/// screen is evicted. Exactly one entry is visible at a time.
pub struct Surface {
    id: String,
    default_content: Option<Content>,
    contents: RefCell<HashMap<ScreenId, Option<Content>>>,
    active: RefCell<Option<ScreenId>>,
    view: Option<Rc<dyn SurfaceView>>,
}

impl Surface {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            default_content: None,
            contents: RefCell::default(),
            active: RefCell::default(),
            view: None,
        }
    }

    /// Content shown for screens that provide nothing for this surface.
    pub fn with_default_content(mut self, content: impl Into<Content>) -> Self {
        self.default_content = Some(content.into());
        self
    }

    pub fn with_view(mut self, view: Rc<dyn SurfaceView>) -> Self {
        self.view = Some(view);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn default_content(&self) -> Option<&str> {
        self.default_content.as_deref()
    }

    /// Store `content` for `screen_id`, falling back to the default content. When `make_active`
    /// is set the content is rendered immediately and replaces whatever was visible.
    pub fn add_content(&self, screen_id: ScreenId, content: Option<Content>, make_active: bool) {
        let content = content.or_else(|| self.default_content.clone());
        self.contents
            .borrow_mut()
            .insert(screen_id, content.clone());

        if make_active {
            *self.active.borrow_mut() = Some(screen_id);
            if let Some(view) = &self.view {
                view.show(screen_id, content.as_deref());
            }
        }
    }

    /// Evict the content stored for `screen_id`. No-op if there is none.
    pub fn remove(&self, screen_id: ScreenId) {
        if self.contents.borrow_mut().remove(&screen_id).is_none() {
            return;
        }
        {
            let mut active = self.active.borrow_mut();
            if *active == Some(screen_id) {
                *active = None;
            }
        }
        if let Some(view) = &self.view {
            view.remove(screen_id);
        }
    }

    /// The content stored for `screen_id`. The outer `Option` is `None` when nothing is stored.
    pub fn content(&self, screen_id: ScreenId) -> Option<Option<Content>> {
        self.contents.borrow().get(&screen_id).cloned()
    }

    pub fn has_content(&self, screen_id: ScreenId) -> bool {
        self.contents.borrow().contains_key(&screen_id)
    }

    /// The screen whose content is visible.
    pub fn active_screen(&self) -> Option<ScreenId> {
        *self.active.borrow()
    }

    /// The visible content.
    pub fn active_content(&self) -> Option<Content> {
        let active = (*self.active.borrow())?;
        self.contents.borrow().get(&active).cloned().flatten()
    }
}

impl From<&str> for Surface {
    fn from(id: &str) -> Self {
        Surface::new(id)
    }
}

impl From<String> for Surface {
    fn from(id: String) -> Self {
        Surface::new(id)
    }
}

impl fmt::Debug for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Surface")
            .field("id", &self.id)
            .field("active", &self.active.borrow())
            .field("stored", &self.contents.borrow().len())
            .finish()
    }
}
