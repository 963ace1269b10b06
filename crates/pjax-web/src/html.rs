use indexmap::IndexMap;
use serde_json::Value;

pub type Attributes = IndexMap<String, Value>;

pub fn encode(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

pub fn tag(name: &str, attrs: &Attributes, content: &str) -> String {
    format!("{}{}{}", open_tag(name, attrs), content, close_tag(name))
}

pub fn open_tag(name: &str, attrs: &Attributes) -> String {
    format!("<{}{}>", name, render_attributes(attrs))
}

pub fn close_tag(name: &str) -> String {
    format!("</{}>", name)
}

/// Renders ` name="value"` pairs in map order.
///
/// `true` renders as `"1"` and `false` as an empty value; `null` drops the
/// attribute entirely.
pub fn render_attributes(attrs: &Attributes) -> String {
    let mut out = String::new();
    for (name, value) in attrs {
        let rendered = match value {
            Value::Null => continue,
            Value::String(s) => encode(s),
            Value::Bool(true) => "1".to_string(),
            Value::Bool(false) => String::new(),
            Value::Number(n) => n.to_string(),
            other => encode(&other.to_string()),
        };
        out.push_str(&format!(" {}=\"{}\"", name, rendered));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn encode_escapes_markup_and_quotes() {
        assert_eq!(
            encode(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn attributes_keep_insertion_order_and_skip_null() {
        let mut attrs = Attributes::new();
        attrs.insert("data-pjax-container".to_string(), json!(""));
        attrs.insert("data-pjax-push-state".to_string(), json!(true));
        attrs.insert("data-pjax-replace-state".to_string(), json!(false));
        attrs.insert("data-pjax-timeout".to_string(), json!(1000));
        attrs.insert("title".to_string(), Value::Null);
        attrs.insert("class".to_string(), json!("a \"b\""));

        assert_eq!(
            render_attributes(&attrs),
            r#" data-pjax-container="" data-pjax-push-state="1" data-pjax-replace-state="" data-pjax-timeout="1000" class="a &quot;b&quot;""#
        );
    }

    #[test]
    fn tag_wraps_raw_content() {
        let html = tag("title", &Attributes::new(), &encode("A < B"));
        assert_eq!(html, "<title>A &lt; B</title>");
    }
}
