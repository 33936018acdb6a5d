//! Turns CMS entries into the view models the templates render.
//!
//! Every field the owner leaves blank falls back to a neutral placeholder so
//! a half-filled stack still renders a complete page.

use time::{
    Date, OffsetDateTime, format_description::FormatItem, format_description::well_known::Rfc3339,
    macros::format_description,
};

use crate::{
    application::content::HomeSnapshot,
    domain::{
        assets::{AssetRef, ResolvedAsset},
        entries::{BlogPost, HomePageContent, PortfolioProject, SiteConfiguration, WorkExperience},
    },
    presentation::views::{
        AboutView, AdminLinkView, BrandView, ContactView, ExperienceCard, FooterView, HeroView, HomeView,
        LayoutChrome, NavigationLinkView, NavigationView, PageMetaView, PostCard,
        PostDetailContext, ProjectCard, SocialLinkView, StatView, build_tag_badges,
    },
};

pub const DEFAULT_SITE_NAME: &str = "My Personal Site";
pub const DEFAULT_OWNER_NAME: &str = "Your Name";
pub const DEFAULT_SUBTITLE: &str = "Creator & Developer";
pub const DEFAULT_BIO: &str = "Welcome to my digital space";
pub const CMS_APP_URL: &str = "https://app.contentstack.com";
const DEFAULT_EMAIL: &str = "hello@example.com";
const DEFAULT_LOCATION: &str = "Remote / Global";
const DEFAULT_ABOUT: &str = "I'm a passionate creator building amazing things. Welcome to my digital space where I share my work, thoughts, and journey.";

const HOME_POST_LIMIT: usize = 3;
const CARD_TAG_LIMIT: usize = 2;
const WORDS_PER_MINUTE: usize = 200;

const POST_DATE_FORMAT: &[FormatItem<'static>] =
    format_description!("[month repr:long] [day padding:none], [year]");
const PERIOD_FORMAT: &[FormatItem<'static>] = format_description!("[month repr:short] [year]");
const PLAIN_DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Builds page view models. Holds the stack API key so bare asset uids can
/// be turned into CDN links.
#[derive(Clone, Default)]
pub struct SiteViews {
    stack_api_key: Option<String>,
}

impl SiteViews {
    pub fn new(stack_api_key: Option<String>) -> Self {
        Self { stack_api_key }
    }

    /// Brand, navigation, footer and metadata for any page.
    pub fn chrome(&self, configuration: Option<&SiteConfiguration>) -> LayoutChrome {
        let site_name = text_or(configuration.map(|c| c.site_name.as_str()), DEFAULT_SITE_NAME);
        let owner_name = text_or(configuration.map(|c| c.owner_name.as_str()), DEFAULT_OWNER_NAME);
        let bio = text_or(configuration.map(|c| c.bio.as_str()), DEFAULT_BIO);
        let title = page_title(configuration);

        let mut links = vec![SocialLinkView {
            label: "Email".to_string(),
            href: format!(
                "mailto:{}",
                text_or(configuration.map(|c| c.owner_email.as_str()), DEFAULT_EMAIL)
            ),
        }];
        if let Some(url) = configuration.and_then(|c| non_blank(c.github_url.as_deref())) {
            links.push(SocialLinkView {
                label: "GitHub".to_string(),
                href: url,
            });
        }
        if let Some(url) = configuration.and_then(|c| non_blank(c.linkedin_url.as_deref())) {
            links.push(SocialLinkView {
                label: "LinkedIn".to_string(),
                href: url,
            });
        }

        LayoutChrome {
            brand: BrandView {
                title: site_name.clone(),
                href: "/".to_string(),
            },
            navigation: NavigationView {
                entries: [
                    ("Home", "/#home"),
                    ("About", "/#about"),
                    ("Experience", "/#work"),
                    ("Portfolio", "/#portfolio"),
                    ("Blog", "/#blog"),
                    ("Contact", "/#contact"),
                ]
                .into_iter()
                .map(|(label, href)| NavigationLinkView {
                    label: label.to_string(),
                    href: href.to_string(),
                    section: href.trim_start_matches("/#").to_string(),
                })
                .collect(),
            },
            footer: FooterView {
                copy: format!(
                    "© {} {site_name}. All rights reserved.",
                    OffsetDateTime::now_utc().year()
                ),
                site_name,
                tagline: bio.clone(),
                links,
            },
            meta: PageMetaView {
                og_title: title.clone(),
                title,
                description: bio.clone(),
                author: owner_name,
                og_description: bio,
            },
            admin: AdminLinkView {
                href: self.dashboard_url(),
            },
        }
    }

    /// The stack dashboard when the API key is known, the app root otherwise.
    fn dashboard_url(&self) -> String {
        match self.stack_api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => format!("{CMS_APP_URL}/stack/{key}/dashboard"),
            _ => CMS_APP_URL.to_string(),
        }
    }

    pub fn home(&self, snapshot: &HomeSnapshot) -> HomeView {
        let configuration = snapshot.configuration.as_ref();
        let home = snapshot.home.as_ref();

        HomeView {
            hero: self.hero(configuration, home),
            about: about(configuration, home),
            experiences: snapshot.experiences.iter().map(experience_card).collect(),
            projects: snapshot
                .projects
                .iter()
                .map(|project| self.project_card(project))
                .collect(),
            posts: snapshot
                .posts
                .iter()
                .take(HOME_POST_LIMIT)
                .map(|post| self.post_card(post))
                .collect(),
            more_posts: snapshot.posts.len().saturating_sub(HOME_POST_LIMIT),
            contact: contact(configuration, home),
        }
    }

    pub fn post_detail(&self, post: &BlogPost) -> PostDetailContext {
        let (iso_date, published) = post_dates(post);
        PostDetailContext {
            title: post.title.clone(),
            author: non_blank(post.author.as_deref()),
            iso_date,
            published,
            read_minutes: read_minutes(post.content.as_deref()),
            tags: build_tag_badges(&post.blog_tags),
            excerpt: non_blank(post.excerpt.as_deref()),
            paragraphs: paragraphs(post.content.as_deref()),
            image_url: self.asset_url(post.featured_image.as_ref()),
        }
    }

    fn hero(
        &self,
        configuration: Option<&SiteConfiguration>,
        home: Option<&HomePageContent>,
    ) -> HeroView {
        let headline = home.map(|h| h.hero_headline.as_str());
        let name = first_text(&[configuration.map(|c| c.owner_name.as_str()), headline])
            .unwrap_or_else(|| DEFAULT_OWNER_NAME.to_string());
        let subtitle = first_text(&[configuration.map(|c| c.site_subtitle.as_str()), headline])
            .unwrap_or_else(|| DEFAULT_SUBTITLE.to_string());
        let intro = first_text(&[
            configuration.map(|c| c.bio.as_str()),
            home.and_then(|h| h.hero_subtext.as_deref()),
        ])
        .unwrap_or_else(|| {
            "Welcome to my digital space where I share my work and journey.".to_string()
        });
        let initial = first_text(&[
            configuration.map(|c| c.owner_name.as_str()),
            home.map(|h| h.title.as_str()),
        ])
        .map(|text| initial_of(&text))
        .unwrap_or_else(|| "U".to_string());

        let (avatar_url, avatar_uid) =
            match configuration.and_then(|c| c.avatar_photo.as_ref()).map(AssetRef::resolve) {
                Some(ResolvedAsset::Url(url)) => (Some(url), None),
                Some(ResolvedAsset::Uid(uid)) => (None, Some(uid)),
                Some(ResolvedAsset::Missing) | None => (None, None),
            };

        HeroView {
            name,
            subtitle,
            intro,
            initial,
            avatar_url,
            avatar_uid,
        }
    }

    fn project_card(&self, project: &PortfolioProject) -> ProjectCard {
        ProjectCard {
            uid: project.uid.clone(),
            title: project.title.clone(),
            initial: initial_of(&project.title),
            description: non_blank(project.description.as_deref()),
            technologies: project.technologies.clone(),
            live_url: non_blank(project.live_url.as_deref()),
            github_url: non_blank(project.github_url.as_deref()),
            project_type: non_blank(project.project_type.as_deref()),
            featured: project.featured,
            image_url: self.asset_url(project.featured_image.as_ref()),
        }
    }

    fn post_card(&self, post: &BlogPost) -> PostCard {
        let (iso_date, published) = post_dates(post);
        PostCard {
            slug: post.slug.clone(),
            title: post.title.clone(),
            initial: initial_of(&post.title),
            excerpt: non_blank(post.excerpt.as_deref()),
            iso_date,
            published,
            read_minutes: read_minutes(post.content.as_deref()),
            badges: build_tag_badges(post.blog_tags.iter().take(CARD_TAG_LIMIT)),
            hidden_tags: post.blog_tags.len().saturating_sub(CARD_TAG_LIMIT),
            image_url: self.asset_url(post.featured_image.as_ref()),
        }
    }

    fn asset_url(&self, asset: Option<&AssetRef>) -> Option<String> {
        asset.and_then(|asset| asset.display_url(self.stack_api_key.as_deref()))
    }
}

/// `"{site name} - {owner name}"`, with placeholders for blank fields.
pub fn page_title(configuration: Option<&SiteConfiguration>) -> String {
    let site_name = text_or(configuration.map(|c| c.site_name.as_str()), DEFAULT_SITE_NAME);
    let owner_name = text_or(configuration.map(|c| c.owner_name.as_str()), DEFAULT_OWNER_NAME);
    format!("{site_name} - {owner_name}")
}

fn about(configuration: Option<&SiteConfiguration>, home: Option<&HomePageContent>) -> AboutView {
    let stat = |value: Option<u32>, fallback: &str, label: &str| StatView {
        value: value
            .filter(|count| *count > 0)
            .map(|count| format!("{count}+"))
            .unwrap_or_else(|| fallback.to_string()),
        label: label.to_string(),
    };
    let time_zone = configuration.and_then(|c| non_blank(c.time_zone.as_deref()));

    AboutView {
        name: text_or(configuration.map(|c| c.owner_name.as_str()), "Me"),
        text: first_text(&[
            configuration.map(|c| c.bio.as_str()),
            home.and_then(|h| h.about_section.as_deref()),
        ])
        .unwrap_or_else(|| DEFAULT_ABOUT.to_string()),
        email: contact_email(configuration, home),
        location: configuration
            .and_then(|c| non_blank(c.work_location.as_deref()))
            .unwrap_or_else(|| DEFAULT_LOCATION.to_string()),
        skills: home.map(|h| h.skills.clone()).unwrap_or_default(),
        stats: vec![
            stat(configuration.and_then(|c| c.years_experience), "3+", "Years Experience"),
            stat(configuration.and_then(|c| c.projects_completed), "50+", "Projects Completed"),
            stat(configuration.and_then(|c| c.technologies_count), "10+", "Technologies"),
            StatView {
                value: time_zone.clone().unwrap_or_else(|| "PST".to_string()),
                label: "Time Zone".to_string(),
            },
        ],
        time_zone,
    }
}

fn contact(configuration: Option<&SiteConfiguration>, home: Option<&HomePageContent>) -> ContactView {
    ContactView {
        email: contact_email(configuration, home),
        github_url: configuration.and_then(|c| non_blank(c.github_url.as_deref())),
        linkedin_url: configuration.and_then(|c| non_blank(c.linkedin_url.as_deref())),
    }
}

fn contact_email(
    configuration: Option<&SiteConfiguration>,
    home: Option<&HomePageContent>,
) -> String {
    first_text(&[
        configuration.map(|c| c.owner_email.as_str()),
        home.and_then(|h| h.contact_email.as_deref()),
    ])
    .unwrap_or_else(|| DEFAULT_EMAIL.to_string())
}

fn experience_card(experience: &WorkExperience) -> ExperienceCard {
    let start = format_entry_date(experience.start_date.as_deref(), PERIOD_FORMAT);
    let end = if experience.current_position {
        "Present".to_string()
    } else {
        format_entry_date(experience.end_date.as_deref(), PERIOD_FORMAT).unwrap_or_default()
    };

    ExperienceCard {
        uid: experience.uid.clone(),
        position: experience.position.clone(),
        company: experience.company.clone(),
        period: format!("{} - {end}", start.unwrap_or_default()),
        is_current: experience.current_position,
        description: non_blank(experience.description.as_deref()),
        technologies: experience.technologies.clone(),
    }
}

fn post_dates(post: &BlogPost) -> (String, String) {
    let raw = non_blank(post.published_date.as_deref())
        .or_else(|| non_blank(post.created_at.as_deref()));
    let published = format_entry_date(raw.as_deref(), POST_DATE_FORMAT).unwrap_or_default();
    (raw.unwrap_or_default(), published)
}

/// Formats an RFC 3339 timestamp or a plain `YYYY-MM-DD` date.
pub fn format_entry_date(raw: Option<&str>, format: &[FormatItem<'_>]) -> Option<String> {
    let date = parse_entry_date(raw?.trim())?;
    date.format(format).ok()
}

fn parse_entry_date(raw: &str) -> Option<Date> {
    OffsetDateTime::parse(raw, &Rfc3339)
        .map(OffsetDateTime::date)
        .ok()
        .or_else(|| Date::parse(raw.get(..10)?, PLAIN_DATE_FORMAT).ok())
}

/// Estimated minutes at 200 words per minute, never less than one.
pub fn read_minutes(content: Option<&str>) -> usize {
    let words = content.map(|text| text.split_whitespace().count()).unwrap_or(0);
    words.div_ceil(WORDS_PER_MINUTE).max(1)
}

fn paragraphs(content: Option<&str>) -> Vec<String> {
    content
        .unwrap_or_default()
        .split("\n\n")
        .map(str::trim)
        .filter(|paragraph| !paragraph.is_empty())
        .map(str::to_string)
        .collect()
}

fn initial_of(text: &str) -> String {
    text.trim()
        .chars()
        .next()
        .map(|ch| ch.to_uppercase().collect())
        .unwrap_or_default()
}

fn first_text(candidates: &[Option<&str>]) -> Option<String> {
    candidates.iter().copied().find_map(non_blank)
}

fn text_or(value: Option<&str>, fallback: &str) -> String {
    non_blank(value).unwrap_or_else(|| fallback.to_string())
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configuration() -> SiteConfiguration {
        SiteConfiguration {
            site_name: "Ada's Notes".to_string(),
            owner_name: "Ada".to_string(),
            bio: "Engines and poetry".to_string(),
            avatar_photo: Some(AssetRef::Reference("blt42".to_string())),
            years_experience: Some(7),
            ..Default::default()
        }
    }

    #[test]
    fn page_title_uses_placeholders_when_unconfigured() {
        assert_eq!(page_title(None), "My Personal Site - Your Name");
        assert_eq!(page_title(Some(&configuration())), "Ada's Notes - Ada");
    }

    #[test]
    fn blank_fields_fall_back_to_placeholders() {
        let config = SiteConfiguration {
            site_name: "   ".to_string(),
            ..Default::default()
        };
        let chrome = SiteViews::default().chrome(Some(&config));
        assert_eq!(chrome.brand.title, DEFAULT_SITE_NAME);
        assert_eq!(chrome.meta.description, DEFAULT_BIO);
    }

    #[test]
    fn hero_defers_bare_avatar_uids_to_the_browser() {
        let views = SiteViews::new(Some("stack".to_string()));
        let snapshot = HomeSnapshot {
            configuration: Some(configuration()),
            ..Default::default()
        };

        let home = views.home(&snapshot);
        assert_eq!(home.hero.name, "Ada");
        assert_eq!(home.hero.initial, "A");
        assert_eq!(home.hero.avatar_uid.as_deref(), Some("blt42"));
        assert!(home.hero.avatar_url.is_none());
        assert_eq!(home.about.stats[0].value, "7+");
        assert_eq!(home.about.stats[1].value, "50+");
    }

    #[test]
    fn home_shows_three_posts_and_counts_the_rest() {
        let posts = (0..5)
            .map(|n| BlogPost {
                title: format!("Post {n}"),
                slug: format!("post-{n}"),
                blog_tags: vec!["a".into(), "b".into(), "c".into()],
                ..Default::default()
            })
            .collect();
        let snapshot = HomeSnapshot {
            posts,
            ..Default::default()
        };

        let home = SiteViews::default().home(&snapshot);
        assert_eq!(home.posts.len(), 3);
        assert_eq!(home.more_posts, 2);
        assert_eq!(home.posts[0].badges.len(), 2);
        assert_eq!(home.posts[0].badges[0].label, "#a");
        assert_eq!(home.posts[0].hidden_tags, 1);
    }

    #[test]
    fn experience_period_reads_present_for_current_roles() {
        let current = WorkExperience {
            start_date: Some("2022-03-01".to_string()),
            current_position: true,
            ..Default::default()
        };
        let past = WorkExperience {
            start_date: Some("2020-06-01T00:00:00.000Z".to_string()),
            end_date: Some("2022-02-28".to_string()),
            ..Default::default()
        };

        assert_eq!(experience_card(&current).period, "Mar 2022 - Present");
        assert_eq!(experience_card(&past).period, "Jun 2020 - Feb 2022");
    }

    #[test]
    fn post_dates_fall_back_to_creation_time() {
        let post = BlogPost {
            created_at: Some("2024-01-15T10:00:00.000Z".to_string()),
            ..Default::default()
        };
        let detail = SiteViews::default().post_detail(&post);
        assert_eq!(detail.published, "January 15, 2024");
        assert_eq!(detail.iso_date, "2024-01-15T10:00:00.000Z");
    }

    #[test]
    fn read_time_rounds_up_and_never_reaches_zero() {
        assert_eq!(read_minutes(None), 1);
        assert_eq!(read_minutes(Some("word ".repeat(201).as_str())), 2);
    }

    #[test]
    fn unparseable_dates_are_dropped() {
        assert_eq!(format_entry_date(Some("soon"), POST_DATE_FORMAT), None);
    }

    #[test]
    fn edit_link_targets_the_stack_dashboard() {
        let chrome = SiteViews::new(Some("blt123".into())).chrome(None);
        assert_eq!(
            chrome.admin.href,
            "https://app.contentstack.com/stack/blt123/dashboard"
        );

        let chrome = SiteViews::new(None).chrome(None);
        assert_eq!(chrome.admin.href, CMS_APP_URL);
    }
}
