//! HTML document builder for [`HtmlHandler`](crate::HtmlHandler) pages.
//!
//! Attribute values and the title are escaped. `body`, `head_html` and
//! `body_bottom_html` are markup and go in verbatim.

use std::fmt;

use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};
use rand::Rng;
use rand::distributions::Alphanumeric;

use crate::response::{ContentType, Response};

const CSRF_TOKEN_LEN: usize = 32;

/// A full HTML page.
///
/// ```rust
/// use lamina::Document;
///
/// let html = Document::new()
///     .title("Home")
///     .css("/app.css")
///     .body("<h1>Hi</h1>")
///     .render();
/// assert!(html.contains("<title>Home</title>"));
/// assert!(html.contains(r#"<link rel="stylesheet" type="text/css" href="/app.css">"#));
/// ```
#[derive(Clone, Debug, Default)]
pub struct Document {
    title: String,
    description: String,
    favicon: String,
    theme_color: Option<String>,
    web_app_title: Option<String>,
    apple_touch_icons: Vec<(u32, String)>,
    canonical: Option<String>,
    css: Vec<String>,
    scripts: Vec<String>,
    script_modules: Vec<String>,
    csrf: bool,
    head_html: String,
    body: String,
    body_bottom_html: String,
}

impl Document {
    pub fn new() -> Self { Self::default() }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn favicon(mut self, href: impl Into<String>) -> Self {
        self.favicon = href.into();
        self
    }

    pub fn theme_color(mut self, color: impl Into<String>) -> Self {
        self.theme_color = Some(color.into());
        self
    }

    /// Also marks the page as web-app capable.
    pub fn web_app_title(mut self, title: impl Into<String>) -> Self {
        self.web_app_title = Some(title.into());
        self
    }

    /// A square icon `size` pixels wide.
    pub fn apple_touch_icon(mut self, size: u32, href: impl Into<String>) -> Self {
        self.apple_touch_icons.push((size, href.into()));
        self
    }

    pub fn canonical(mut self, url: impl Into<String>) -> Self {
        self.canonical = Some(url.into());
        self
    }

    pub fn css(mut self, href: impl Into<String>) -> Self {
        self.css.push(href.into());
        self
    }

    pub fn script(mut self, src: impl Into<String>) -> Self {
        self.scripts.push(src.into());
        self
    }

    pub fn script_module(mut self, src: impl Into<String>) -> Self {
        self.script_modules.push(src.into());
        self
    }

    /// Issue a CSRF token when written to a response.
    pub fn csrf(mut self, on: bool) -> Self {
        self.csrf = on;
        self
    }

    /// Extra markup appended to `<head>`.
    pub fn head_html(mut self, html: impl Into<String>) -> Self {
        self.head_html.push_str(&html.into());
        self
    }

    pub fn body(mut self, html: impl Into<String>) -> Self {
        self.body = html.into();
        self
    }

    /// Extra markup after the scripts, just before `</body>`.
    pub fn body_bottom_html(mut self, html: impl Into<String>) -> Self {
        self.body_bottom_html.push_str(&html.into());
        self
    }

    /// The document without a CSRF token.
    pub fn render(&self) -> String {
        self.render_with(None)
    }

    /// Renders into `res` as `text/html`. With [`csrf`](Self::csrf) on, a
    /// fresh token is set as the `csrf` cookie and mirrored into
    /// `localStorage` for the page's scripts to echo back in `x-csrf`.
    pub fn write_to(&self, res: &mut Response) {
        let token = self.csrf.then(generate_token);
        if let Some(token) = &token {
            res.csrf(token.as_str());
        }
        res.set_content_type(ContentType::Html)
            .set_body(self.render_with(token.as_deref()));
    }

    fn render_with(&self, csrf: Option<&str>) -> String {
        Html { doc: self, csrf }.to_string()
    }
}

/// A document paired with the CSRF token it embeds, if any.
struct Html<'a> {
    doc: &'a Document,
    csrf: Option<&'a str>,
}

impl fmt::Display for Html<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let doc = self.doc;
        f.write_str("<!DOCTYPE html>\n<html>\n<head>\n")?;
        f.write_str(r#"<meta http-equiv="Content-Type" content="text/html; charset=UTF-8">"#)?;
        write!(f, r#"<meta name="description" content="{}">"#, attr(&doc.description))?;
        f.write_str(r#"<meta name="viewport" content="user-scalable=no, initial-scale=1, maximum-scale=1, minimum-scale=1, width=device-width">"#)?;
        if !doc.favicon.is_empty() {
            write!(f, r#"<link rel="shortcut icon" href="{}">"#, attr(&doc.favicon))?;
        }
        write!(f, "<title>{}</title>", text(&doc.title))?;
        for href in &doc.css {
            write!(f, r#"<link rel="stylesheet" type="text/css" href="{}">"#, attr(href))?;
        }
        if let Some(color) = &doc.theme_color {
            write!(f, r#"<meta name="theme-color" content="{}" id="theme-color">"#, attr(color))?;
        }
        if let Some(title) = &doc.web_app_title {
            write!(f, r#"<meta name="apple-mobile-web-app-title" content="{}">"#, attr(title))?;
            f.write_str(r#"<meta name="apple-mobile-web-app-capable" content="yes">"#)?;
        }
        for (size, href) in &doc.apple_touch_icons {
            write!(f, r#"<link rel="apple-touch-icon" sizes="{size}x{size}" href="{}">"#, attr(href))?;
        }
        if let Some(url) = &doc.canonical {
            write!(f, r#"<link rel="canonical" href="{}">"#, attr(url))?;
        }
        f.write_str(&doc.head_html)?;
        write!(f, "\n</head>\n<body>\n{}\n", doc.body)?;

        for src in &doc.scripts {
            write!(f, r#"<script type="text/javascript" src="{}"></script>"#, attr(src))?;
        }
        if let Some(token) = self.csrf {
            write!(f, r#"<script type="text/javascript">localStorage.setItem('csrf', '{token}');</script>"#)?;
        }
        for src in &doc.script_modules {
            write!(f, r#"<script type="module" src="{}"></script>"#, attr(src))?;
        }
        write!(f, "\n{}\n</body>\n</html>\n", doc.body_bottom_html)
    }
}

fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(CSRF_TOKEN_LEN)
        .map(char::from)
        .collect()
}
