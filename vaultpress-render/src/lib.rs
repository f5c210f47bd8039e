//! # vaultpress-render
//!
//! HTML rendering for vaultpress: the user page template, the sidebar
//! navigation, and the built-in Askama fragments (landing page, section
//! index bodies, breadcrumbs).

pub mod navigation;
pub mod page;
pub mod templates;

pub use navigation::Sidebar;
pub use page::{PageContext, PageTemplate, TemplateError};
pub use templates::{
    BreadcrumbTemplate, LandingCard, LandingTemplate, LinkEntry, SectionIndexTemplate,
};
