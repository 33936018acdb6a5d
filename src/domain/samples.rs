//! Sample entries seeded into a fresh stack.
//!
//! No site configuration is seeded; the owner creates it through the setup
//! form.

use serde_json::{Value, json};

use crate::domain::content_types::{BLOG_POST, HOME_PAGE, PORTFOLIO_PROJECT, WORK_EXPERIENCE};

/// How provisioning decides whether a sample is already present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExistenceProbe {
    /// Any entry of the content type counts.
    AnyEntry,
    /// An entry whose `field` equals `value` counts.
    Field {
        field: &'static str,
        value: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SampleEntry {
    pub content_type: &'static str,
    pub probe: ExistenceProbe,
    pub body: Value,
}

impl SampleEntry {
    fn keyed(content_type: &'static str, field: &'static str, value: &'static str, body: Value) -> Self {
        Self {
            content_type,
            probe: ExistenceProbe::Field { field, value },
            body,
        }
    }
}

pub fn sample_entries() -> Vec<SampleEntry> {
    vec![
        SampleEntry {
            content_type: HOME_PAGE,
            probe: ExistenceProbe::AnyEntry,
            body: json!({
                "title": "Welcome to My Bio Site",
                "hero_headline": "Full-Stack Developer & Digital Creator",
                "hero_subtext": "Building amazing web experiences with modern technologies",
                "about_section": "I'm a passionate full-stack developer with expertise in Rust, TypeScript, and cloud technologies. I love creating innovative solutions that make a real impact.",
                "skills": ["Rust", "TypeScript", "React", "Node.js", "Python", "AWS"],
                "contact_email": "hello@example.com"
            }),
        },
        SampleEntry::keyed(
            BLOG_POST,
            "slug",
            "getting-started-headless-cms",
            json!({
                "title": "Getting Started with Headless CMS",
                "slug": "getting-started-headless-cms",
                "excerpt": "Learn how headless CMS architecture can change your content management strategy.",
                "content": "Traditional monolithic CMS platforms are being challenged by a new approach: the headless CMS. Content is modelled once, stored behind an API, and delivered to any front end that asks for it.",
                "author": "John Doe",
                "published_date": "2024-01-15T10:00:00.000Z",
                "blog_tags": ["CMS", "Architecture", "Web Development"]
            }),
        ),
        SampleEntry::keyed(
            BLOG_POST,
            "slug",
            "building-scalable-web-applications",
            json!({
                "title": "Building Scalable Web Applications",
                "slug": "building-scalable-web-applications",
                "excerpt": "Patterns for web applications that can grow with your business needs.",
                "content": "Scalability is not only about handling more users. It is about writing code that stays maintainable as the team and the feature set grow.",
                "author": "John Doe",
                "published_date": "2024-01-10T14:30:00.000Z",
                "blog_tags": ["Architecture", "Scalability"]
            }),
        ),
        SampleEntry::keyed(
            WORK_EXPERIENCE,
            "company",
            "TechCorp Solutions",
            json!({
                "title": "Senior Full-Stack Developer at TechCorp",
                "company": "TechCorp Solutions",
                "position": "Senior Full-Stack Developer",
                "start_date": "2022-03-01T00:00:00.000Z",
                "current_position": true,
                "description": "Leading the development of scalable web applications and the platform services behind them.",
                "technologies": ["Rust", "React", "AWS", "PostgreSQL"]
            }),
        ),
        SampleEntry::keyed(
            WORK_EXPERIENCE,
            "company",
            "StartupXYZ",
            json!({
                "title": "Frontend Developer at StartupXYZ",
                "company": "StartupXYZ",
                "position": "Frontend Developer",
                "start_date": "2020-06-01T00:00:00.000Z",
                "end_date": "2022-02-28T00:00:00.000Z",
                "current_position": false,
                "description": "Built responsive web applications and improved user experience across multiple products.",
                "technologies": ["Vue.js", "Express.js", "MongoDB"]
            }),
        ),
        SampleEntry::keyed(
            PORTFOLIO_PROJECT,
            "slug",
            "ecommerce-platform",
            json!({
                "title": "E-Commerce Platform",
                "slug": "ecommerce-platform",
                "description": "A full-featured e-commerce platform with payment integration.",
                "technologies": ["Rust", "React", "Stripe", "PostgreSQL"],
                "live_url": "https://ecommerce-demo.example.com",
                "github_url": "https://github.com/example/ecommerce-platform",
                "project_type": "Web Application",
                "featured": true
            }),
        ),
        SampleEntry::keyed(
            PORTFOLIO_PROJECT,
            "slug",
            "task-management-app",
            json!({
                "title": "Task Management App",
                "slug": "task-management-app",
                "description": "A collaborative task management application with real-time updates.",
                "technologies": ["TypeScript", "WebSockets", "Redis"],
                "live_url": "https://taskapp-demo.example.com",
                "github_url": "https://github.com/example/task-management",
                "project_type": "Web Application",
                "featured": true
            }),
        ),
    ]
}
