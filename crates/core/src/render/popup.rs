/// Popup content shown when a marker or polygon is clicked
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Popup {
    pub title: String,
    pub description: Option<String>,
    /// Internal navigation target (another map or page inside the app)
    pub link: Option<String>,
}

impl Popup {
    pub fn new(title: &str, description: Option<&str>, link: Option<&str>) -> Self {
        let non_empty = |s: &str| {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_owned())
        };

        Self {
            title: title.to_owned(),
            description: description.and_then(non_empty),
            link: link.and_then(non_empty),
        }
    }

    pub fn to_html(&self) -> String {
        let mut html = format!("<strong>{}</strong>", escape_html(&self.title));
        if let Some(description) = &self.description {
            html.push_str(&format!("<p>{}</p>", escape_html(description)));
        }
        if let Some(link) = &self.link {
            html.push_str(&format!(
                "<a href=\"{}\" data-internal-link=\"true\">Open link</a>",
                escape_html(link)
            ));
        }
        html
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_only() {
        let popup = Popup::new("Rivendell", None, None);
        assert_eq!(popup.to_html(), "<strong>Rivendell</strong>");
    }

    #[test]
    fn test_blank_parts_dropped() {
        let popup = Popup::new("Bree", Some("   "), Some(""));
        assert_eq!(popup.description, None);
        assert_eq!(popup.link, None);
    }

    #[test]
    fn test_content_is_escaped() {
        let popup = Popup::new("<b>Mordor</b>", Some("One does not \"simply\" walk"), Some("#/maps/1&2"));
        let html = popup.to_html();
        assert!(html.starts_with("<strong>&lt;b&gt;Mordor&lt;/b&gt;</strong>"));
        assert!(html.contains("<p>One does not &quot;simply&quot; walk</p>"));
        assert!(html.contains("href=\"#/maps/1&amp;2\""));
    }
}
