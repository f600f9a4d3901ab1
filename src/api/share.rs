// src/api/share.rs — Share page with Open Graph tags

use minijinja::{context, Environment};

const SHARE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="ja">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>夏祭りの思い出アート - TalkArt</title>
  <meta property="og:title" content="夏祭りの思い出アート" />
  <meta property="og:description" content="AIが描いた夏祭りの思い出をご覧ください" />
  <meta property="og:type" content="website" />
  <meta property="og:url" content="{{ page_url }}" />
  <meta property="og:image" content="{{ image_url }}" />
  <meta name="twitter:card" content="summary_large_image" />
  <style>
    body { margin: 0; font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
           background: linear-gradient(to bottom, #4c1d95, #5b21b6); color: white; min-height: 100vh;
           display: flex; align-items: center; justify-content: center; padding: 20px; }
    .container { max-width: 600px; text-align: center; }
    h1 { font-size: 2rem; margin-bottom: 1rem; }
    .artwork { background: white; padding: 8px; border-radius: 8px; display: inline-block;
               margin-bottom: 2rem; box-shadow: 0 20px 25px -5px rgba(0, 0, 0, 0.1); }
    .artwork img { max-width: 100%; height: auto; border-radius: 4px; }
    .cta { display: inline-block; background: #fbbf24; color: #4c1d95; padding: 12px 32px;
           border-radius: 9999px; text-decoration: none; font-weight: bold; }
  </style>
</head>
<body>
  <div class="container">
    <h1>夏祭りの思い出アート</h1>
    <div class="artwork">
      <img src="/api/talkart/image/{{ id }}" alt="Generated artwork" />
    </div>
    <p>AIが描いた特別な夏祭りの思い出です</p>
    <a href="{{ home_url }}" class="cta">あなたも作ってみる</a>
  </div>
</body>
</html>
"#;

/// Render the share page for an artwork. Values are HTML-escaped.
pub fn render_share_page(artwork_id: &str, public_base_url: &str) -> anyhow::Result<String> {
    let base = public_base_url.trim_end_matches('/');
    let mut env = Environment::new();
    // `.html` turns on auto-escaping
    env.add_template("share.html", SHARE_TEMPLATE)?;
    let html = env.get_template("share.html")?.render(context! {
        id => artwork_id,
        image_url => format!("{base}/api/talkart/image/{artwork_id}"),
        page_url => format!("{base}/api/talkart/share/{artwork_id}"),
        home_url => format!("{base}/"),
    })?;
    Ok(html)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_share_page_tags() {
        let html = render_share_page("abc-123", "https://festival.example/").unwrap();
        assert!(html.contains("<title>夏祭りの思い出アート - TalkArt</title>"));
        assert!(html.contains(r#"<meta property="og:image" content="https://festival.example/api/talkart/image/abc-123" />"#));
        assert!(html.contains(r#"<img src="/api/talkart/image/abc-123""#));
        assert!(html.contains("あなたも作ってみる"));
    }

    #[test]
    fn test_share_page_escapes_id() {
        let html = render_share_page("\"><script>x</script>", "http://localhost:3000").unwrap();
        assert!(!html.contains("<script>x</script>"));
        assert!(html.contains("&lt;script&gt;"));
    }
}
