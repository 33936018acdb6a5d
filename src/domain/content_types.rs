//! Content-type schemas registered with the CMS during provisioning.

use serde::Serialize;

pub const SITE_CONFIGURATION: &str = "site_configuration";
pub const HOME_PAGE: &str = "home_page";
pub const BLOG_POST: &str = "blog_post";
pub const WORK_EXPERIENCE: &str = "work_experience";
pub const PORTFOLIO_PROJECT: &str = "portfolio_project";

/// Every content type the site reads from.
pub const REQUIRED_CONTENT_TYPES: [&str; 5] = [
    SITE_CONFIGURATION,
    HOME_PAGE,
    BLOG_POST,
    WORK_EXPERIENCE,
    PORTFOLIO_PROJECT,
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentTypeSchema {
    pub title: &'static str,
    pub uid: &'static str,
    pub schema: Vec<FieldSchema>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Text,
    Isodate,
    Boolean,
    Number,
    File,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSchema {
    pub display_name: &'static str,
    pub uid: &'static str,
    pub data_type: DataType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_metadata: Option<FieldMetadata>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub multiple: bool,
    pub unique: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldMetadata {
    #[serde(rename = "_default", skip_serializing_if = "std::ops::Not::not")]
    pub is_default: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub mandatory: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub multiline: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'static str>,
}

impl FieldSchema {
    fn new(display_name: &'static str, uid: &'static str, data_type: DataType) -> Self {
        Self {
            display_name,
            uid,
            data_type,
            field_metadata: None,
            multiple: false,
            unique: false,
        }
    }

    fn text(display_name: &'static str, uid: &'static str) -> Self {
        Self::new(display_name, uid, DataType::Text)
    }

    /// The entry title field every content type carries.
    fn title() -> Self {
        let mut field = Self::text("Title", "title");
        field.metadata().is_default = true;
        field.metadata().mandatory = true;
        field
    }

    fn metadata(&mut self) -> &mut FieldMetadata {
        self.field_metadata.get_or_insert_with(FieldMetadata::default)
    }

    fn mandatory(mut self) -> Self {
        self.metadata().mandatory = true;
        self
    }

    fn multiline(mut self) -> Self {
        self.metadata().multiline = true;
        self
    }

    fn described(mut self, description: &'static str) -> Self {
        self.metadata().description = Some(description);
        self
    }

    fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }

    fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

impl ContentTypeSchema {
    pub fn site_configuration() -> Self {
        Self {
            title: "Site Configuration",
            uid: SITE_CONFIGURATION,
            schema: vec![
                FieldSchema::title(),
                FieldSchema::text("Site Name", "site_name")
                    .described("The name of your personal website")
                    .mandatory(),
                FieldSchema::text("Site Subtitle", "site_subtitle")
                    .described("A short description or tagline for your site"),
                FieldSchema::text("Owner Name", "owner_name")
                    .described("Your full name")
                    .mandatory(),
                FieldSchema::text("Owner Email", "owner_email")
                    .described("Your contact email address"),
                FieldSchema::text("Bio", "bio")
                    .described("A short bio about yourself")
                    .multiline(),
                FieldSchema::new("Avatar Photo", "avatar_photo", DataType::File)
                    .described("Upload a profile photo (optional)"),
                FieldSchema::new("Resume / CV", "resume_cv", DataType::File)
                    .described("Downloadable resume (optional)"),
                FieldSchema::new("Years Experience", "years_experience", DataType::Number),
                FieldSchema::text("Work Location", "work_location"),
                FieldSchema::new("Projects Completed", "projects_completed", DataType::Number),
                FieldSchema::new("Technologies Count", "technologies_count", DataType::Number),
                FieldSchema::text("Time Zone", "time_zone"),
                FieldSchema::text("GitHub URL", "github_url"),
                FieldSchema::text("LinkedIn URL", "linkedin_url"),
                FieldSchema::new("Setup Completed", "setup_completed", DataType::Boolean),
            ],
        }
    }

    pub fn home_page() -> Self {
        Self {
            title: "Home Page",
            uid: HOME_PAGE,
            schema: vec![
                FieldSchema::title(),
                FieldSchema::text("Hero Headline", "hero_headline").mandatory(),
                FieldSchema::text("Hero Subtext", "hero_subtext"),
                FieldSchema::text("About Section", "about_section").multiline(),
                FieldSchema::text("Skills", "skills").multiple(),
                FieldSchema::text("Contact Email", "contact_email"),
            ],
        }
    }

    pub fn blog_post() -> Self {
        Self {
            title: "Blog Post",
            uid: BLOG_POST,
            schema: vec![
                FieldSchema::title(),
                FieldSchema::text("Slug", "slug").mandatory().unique(),
                FieldSchema::text("Excerpt", "excerpt").multiline(),
                FieldSchema::text("Content", "content").multiline(),
                FieldSchema::text("Author", "author"),
                FieldSchema::new("Published Date", "published_date", DataType::Isodate),
                // `tags` is reserved by the CMS.
                FieldSchema::text("Tags", "blog_tags").multiple(),
                FieldSchema::new("Featured Image", "featured_image", DataType::File),
            ],
        }
    }

    pub fn work_experience() -> Self {
        Self {
            title: "Work Experience",
            uid: WORK_EXPERIENCE,
            schema: vec![
                FieldSchema::title(),
                FieldSchema::text("Company", "company").mandatory(),
                FieldSchema::text("Position", "position").mandatory(),
                FieldSchema::new("Start Date", "start_date", DataType::Isodate),
                FieldSchema::new("End Date", "end_date", DataType::Isodate),
                FieldSchema::new("Current Position", "current_position", DataType::Boolean),
                FieldSchema::text("Description", "description").multiline(),
                FieldSchema::text("Technologies", "technologies").multiple(),
            ],
        }
    }

    pub fn portfolio_project() -> Self {
        Self {
            title: "Portfolio Project",
            uid: PORTFOLIO_PROJECT,
            schema: vec![
                FieldSchema::title(),
                FieldSchema::text("Slug", "slug").mandatory().unique(),
                FieldSchema::text("Description", "description").multiline(),
                FieldSchema::text("Technologies", "technologies").multiple(),
                FieldSchema::text("Live URL", "live_url"),
                FieldSchema::text("GitHub URL", "github_url"),
                FieldSchema::text("Project Type", "project_type"),
                FieldSchema::new("Featured", "featured", DataType::Boolean),
                FieldSchema::new("Featured Image", "featured_image", DataType::File),
            ],
        }
    }
}

/// Schemas in the order they are created.
pub fn catalogue() -> Vec<ContentTypeSchema> {
    vec![
        ContentTypeSchema::site_configuration(),
        ContentTypeSchema::home_page(),
        ContentTypeSchema::blog_post(),
        ContentTypeSchema::work_experience(),
        ContentTypeSchema::portfolio_project(),
    ]
}
