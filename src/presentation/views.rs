use crate::application::error::{ErrorReport, HttpError};
use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

pub fn render_not_found_response(chrome: LayoutChrome, content: ErrorPageView) -> Response {
    let view = LayoutContext::new(chrome, content);
    let mut response = render_template_response(ErrorTemplate { view }, StatusCode::NOT_FOUND);
    ErrorReport::from_message(
        "presentation::views::render_not_found_response",
        StatusCode::NOT_FOUND,
        "Resource not found",
    )
    .attach(&mut response);
    response
}

#[derive(Clone)]
pub struct BrandView {
    pub title: String,
    pub href: String,
}

#[derive(Clone)]
pub struct NavigationLinkView {
    pub label: String,
    pub href: String,
    /// Id of the home-page section the link scrolls to.
    pub section: String,
}

#[derive(Clone)]
pub struct NavigationView {
    pub entries: Vec<NavigationLinkView>,
}

/// Fixed "Edit Content" shortcut into the CMS dashboard.
#[derive(Clone)]
pub struct AdminLinkView {
    pub href: String,
}

#[derive(Clone)]
pub struct SocialLinkView {
    pub label: String,
    pub href: String,
}

#[derive(Clone)]
pub struct FooterView {
    pub site_name: String,
    pub tagline: String,
    pub copy: String,
    pub links: Vec<SocialLinkView>,
}

#[derive(Clone)]
pub struct PageMetaView {
    pub title: String,
    pub description: String,
    pub author: String,
    pub og_title: String,
    pub og_description: String,
}

impl PageMetaView {
    pub fn with_title(self, title: String) -> Self {
        Self {
            og_title: title.clone(),
            title,
            ..self
        }
    }
}

/// Page chrome shared by every template: brand, navigation, footer and metadata.
#[derive(Clone)]
pub struct LayoutChrome {
    pub brand: BrandView,
    pub navigation: NavigationView,
    pub footer: FooterView,
    pub meta: PageMetaView,
    pub admin: AdminLinkView,
}

#[derive(Clone)]
pub struct LayoutContext<T> {
    pub brand: BrandView,
    pub navigation: NavigationView,
    pub footer: FooterView,
    pub meta: PageMetaView,
    pub admin: AdminLinkView,
    pub content: T,
}

impl<T> LayoutContext<T> {
    pub fn new(chrome: LayoutChrome, content: T) -> Self {
        Self {
            brand: chrome.brand,
            navigation: chrome.navigation,
            footer: chrome.footer,
            meta: chrome.meta,
            admin: chrome.admin,
            content,
        }
    }
}

#[derive(Clone)]
pub struct HeroView {
    pub name: String,
    pub subtitle: String,
    pub intro: String,
    pub initial: String,
    pub avatar_url: Option<String>,
    /// Bare asset uid resolved in the browser through `/api/asset/{uid}`.
    pub avatar_uid: Option<String>,
}

#[derive(Clone)]
pub struct StatView {
    pub value: String,
    pub label: String,
}

#[derive(Clone)]
pub struct AboutView {
    pub name: String,
    pub text: String,
    pub email: String,
    pub location: String,
    pub time_zone: Option<String>,
    pub skills: Vec<String>,
    pub stats: Vec<StatView>,
}

#[derive(Clone)]
pub struct ExperienceCard {
    pub uid: String,
    pub position: String,
    pub company: String,
    pub period: String,
    pub is_current: bool,
    pub description: Option<String>,
    pub technologies: Vec<String>,
}

#[derive(Clone)]
pub struct ProjectCard {
    pub uid: String,
    pub title: String,
    pub initial: String,
    pub description: Option<String>,
    pub technologies: Vec<String>,
    pub live_url: Option<String>,
    pub github_url: Option<String>,
    pub project_type: Option<String>,
    pub featured: bool,
    pub image_url: Option<String>,
}

#[derive(Clone)]
pub struct TagBadge {
    pub label: String,
}

#[derive(Clone)]
pub struct PostCard {
    pub slug: String,
    pub title: String,
    pub initial: String,
    pub excerpt: Option<String>,
    pub iso_date: String,
    pub published: String,
    pub read_minutes: usize,
    pub badges: Vec<TagBadge>,
    pub hidden_tags: usize,
    pub image_url: Option<String>,
}

#[derive(Clone)]
pub struct ContactView {
    pub email: String,
    pub github_url: Option<String>,
    pub linkedin_url: Option<String>,
}

pub struct HomeView {
    pub hero: HeroView,
    pub about: AboutView,
    pub experiences: Vec<ExperienceCard>,
    pub projects: Vec<ProjectCard>,
    pub posts: Vec<PostCard>,
    pub more_posts: usize,
    pub contact: ContactView,
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub view: LayoutContext<HomeView>,
}

pub struct PostDetailContext {
    pub title: String,
    pub author: Option<String>,
    pub iso_date: String,
    pub published: String,
    pub read_minutes: usize,
    pub tags: Vec<TagBadge>,
    pub excerpt: Option<String>,
    pub paragraphs: Vec<String>,
    pub image_url: Option<String>,
}

#[derive(Template)]
#[template(path = "blog_post.html")]
pub struct PostTemplate {
    pub view: LayoutContext<PostDetailContext>,
}

pub struct SetupPageView {
    pub max_avatar_label: String,
    pub status_poll_attempts: u32,
}

#[derive(Template)]
#[template(path = "setup.html")]
pub struct SetupTemplate {
    pub view: LayoutContext<SetupPageView>,
}

pub struct RefreshPageView {
    pub endpoint: String,
}

#[derive(Template)]
#[template(path = "refresh.html")]
pub struct RefreshTemplate {
    pub view: LayoutContext<RefreshPageView>,
}

pub struct ErrorPageView {
    pub title: String,
    pub message: String,
    pub primary_action: Option<ErrorAction>,
}

impl ErrorPageView {
    pub fn not_found() -> Self {
        Self {
            title: "Page Not Found".to_string(),
            message: "The page you requested does not exist. Try returning to the homepage to continue exploring.".to_string(),
            primary_action: Some(ErrorAction::home()),
        }
    }

    pub fn post_not_found() -> Self {
        Self {
            title: "Post Not Found".to_string(),
            message: "This article may have been moved or is not published yet.".to_string(),
            primary_action: Some(ErrorAction {
                href: "/#blog".to_string(),
                label: "Back to Blog".to_string(),
            }),
        }
    }
}

pub struct ErrorAction {
    pub href: String,
    pub label: String,
}

impl ErrorAction {
    pub fn home() -> Self {
        Self {
            href: "/".to_string(),
            label: "Back to home".to_string(),
        }
    }
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub view: LayoutContext<ErrorPageView>,
}

pub fn build_tag_badges<'a, T>(tags: T) -> Vec<TagBadge>
where
    T: IntoIterator<Item = &'a String>,
{
    tags.into_iter()
        .map(|name| TagBadge {
            label: format!("#{name}"),
        })
        .collect()
}
