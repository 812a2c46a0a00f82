//! HTML pages rendered with handlebars

use handlebars::{Handlebars, RenderError, TemplateError};
use serde::Serialize;

use crate::gallery::MediaEntry;

const RANDOM_TEMPLATE: &str = include_str!("../../templates/random.hbs");
const UPLOAD_TEMPLATE: &str = include_str!("../../templates/upload.hbs");

#[derive(Serialize)]
struct PageEntry<'a> {
    id: &'a str,
    fullpath: &'a str,
    is_video: bool,
}

#[derive(Serialize)]
struct RandomData<'a> {
    title: &'a str,
    absolute_url: String,
    entry: PageEntry<'a>,
}

#[derive(Serialize)]
struct UploadData<'a> {
    route: &'a str,
    upload_path: String,
}

/// Page renderer holding the compiled templates
pub struct Pages {
    handlebars: Handlebars<'static>,
    website_url: String,
}

impl Pages {
    const RANDOM: &'static str = "random";
    const UPLOAD: &'static str = "upload";

    /// Compile the built-in templates
    pub fn new(website_url: &str) -> Result<Self, TemplateError> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        handlebars.register_template_string(Self::RANDOM, RANDOM_TEMPLATE)?;
        handlebars.register_template_string(Self::UPLOAD, UPLOAD_TEMPLATE)?;

        Ok(Self {
            handlebars,
            website_url: website_url.trim_end_matches('/').to_string(),
        })
    }

    /// Page showing a single randomly picked entry
    pub fn random(&self, title: &str, entry: &MediaEntry) -> Result<String, RenderError> {
        let data = RandomData {
            title,
            absolute_url: format!("{}{}", self.website_url, entry.public_path),
            entry: PageEntry {
                id: &entry.file_name,
                fullpath: &entry.public_path,
                is_video: entry.kind.is_video(),
            },
        };
        self.handlebars.render(Self::RANDOM, &data)
    }

    /// Upload form posting to `/upload/{route}`
    pub fn upload(&self, route: &str) -> Result<String, RenderError> {
        let data = UploadData {
            route,
            upload_path: format!("/upload/{}", route),
        };
        self.handlebars.render(Self::UPLOAD, &data)
    }
}
