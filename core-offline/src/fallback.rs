//! Synthesized fallback responses
//!
//! When both the network and the caches come up empty, the interceptor never
//! surfaces an error; it answers with one of these placeholders instead.

use bridge_traits::storage::ResponseSnapshot;

/// Self-contained offline page: inline-styled, no external dependencies, a
/// manual retry link, and an automatic reload bound to the browser's online
/// event.
const OFFLINE_PAGE_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>BriefCast - Offline</title>
  <style>
    body {
      font-family: system-ui, -apple-system, BlinkMacSystemFont, sans-serif;
      background: linear-gradient(145deg, #4F46E5, #6422FE);
      color: white;
      height: 100vh;
      margin: 0;
      display: flex;
      flex-direction: column;
      align-items: center;
      justify-content: center;
      text-align: center;
      padding: 1rem;
    }
    .container {
      background-color: rgba(255, 255, 255, 0.1);
      padding: 2rem;
      border-radius: 0.5rem;
      backdrop-filter: blur(10px);
      max-width: 500px;
    }
    h1 {
      margin-top: 0;
    }
    .button {
      background-color: #F59E0B;
      color: white;
      padding: 0.5rem 1rem;
      border-radius: 0.25rem;
      text-decoration: none;
      display: inline-block;
      margin-top: 1rem;
    }
  </style>
</head>
<body>
  <div class="container">
    <h1>You're Offline</h1>
    <p>BriefCast is currently offline. You can still access your downloaded podcasts.</p>
    <a href="/" class="button">Try Again</a>
  </div>
  <script>
    window.addEventListener('online', function() {
      window.location.reload();
    });
  </script>
</body>
</html>
"#;

/// Generic network-failure placeholder.
pub fn network_error() -> ResponseSnapshot {
    ResponseSnapshot::new(408, "text/plain", "Network error")
}

/// Harmless no-op script served when a build chunk cannot be loaded, so a
/// missing chunk degrades instead of hard-crashing the application.
pub fn placeholder_script() -> ResponseSnapshot {
    ResponseSnapshot::new(
        200,
        "application/javascript",
        "console.log(\"Failed to load script\");",
    )
}

/// Empty stylesheet counterpart of [`placeholder_script`].
pub fn placeholder_stylesheet() -> ResponseSnapshot {
    ResponseSnapshot::new(200, "text/css", "/* Failed to load stylesheet */")
}

/// The synthesized offline page returned for failed navigations with no
/// cached copy.
pub fn offline_page() -> ResponseSnapshot {
    ResponseSnapshot::new(200, "text/html", OFFLINE_PAGE_HTML)
}
