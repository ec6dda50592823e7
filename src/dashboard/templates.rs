//! Inline HTML for the session login flow.
//!
//! These pages are self-contained (no external assets) so they render even
//! when the caller is not allowed to fetch anything under `/ui/`.

/// Login endpoint the pages POST credentials to
pub const LOGIN_ENDPOINT: &str = "/ui/login";

/// Render the 401 challenge page.
///
/// After a successful login the browser navigates back to `target`, the
/// request URI that was rejected. `target` is HTML-escaped before insertion.
pub fn challenge_page(target: &str) -> String {
    let mut html = String::with_capacity(CHALLENGE_HEAD.len() + CHALLENGE_TAIL.len() + 64);
    html.push_str(CHALLENGE_HEAD);
    html.push_str(&escape_html(target));
    html.push_str(CHALLENGE_TAIL);
    html
}

/// Escape the five HTML-significant characters. `/` is left alone so request
/// paths stay navigable inside the inline script.
fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Minimal prompt-driven login page served at `GET /login`
pub const LOGIN_PAGE: &str = r#"<!doctype html>
<html>
<head><meta charset="utf-8"><title>Dkron Login</title></head>
<body>
<button id="b">Login</button>
<script>
document.getElementById('b').addEventListener('click', async function () {
  const u = prompt('Username');
  if (!u) return;
  const p = prompt('Password');
  if (p === null) return;
  const r = await fetch('/ui/login', {
    method: 'POST',
    headers: { 'Content-Type': 'application/json' },
    body: JSON.stringify({ username: u, password: p })
  });
  if (r.ok) { location.href = '/ui/'; } else { alert('Login failed'); }
});
</script>
</body>
</html>"#;

const CHALLENGE_HEAD: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Dkron Login</title>
<style>
  *, *:before, *:after { box-sizing: border-box; }
  body {
    margin: 0;
    min-height: 100vh;
    display: flex;
    align-items: center;
    justify-content: center;
    font-family: system-ui, -apple-system, 'Segoe UI', Roboto, sans-serif;
    background: radial-gradient(1000px 500px at 20% -10%, #1a1c5a, #0b0c2e);
    color: #eaeaf2;
  }
  .card {
    width: 360px;
    padding: 26px 24px;
    background: #15163f;
    border-radius: 14px;
    box-shadow: 0 18px 40px rgba(0, 0, 0, .35);
  }
  .brand { display: flex; align-items: center; justify-content: center; gap: 8px; }
  .logo {
    width: 30px; height: 30px; border-radius: 50%;
    display: inline-flex; align-items: center; justify-content: center;
    background: #4c5bdc; color: #fff; font-weight: 700;
  }
  h1 { margin: 0; font-size: 18px; color: #fff; }
  .subtitle { margin: 6px 0 20px; font-size: 13px; color: #b7b8d6; text-align: center; }
  .field { display: flex; flex-direction: column; margin-bottom: 12px; }
  label { font-size: 12px; color: #b7b8d6; margin-bottom: 6px; }
  input {
    width: 100%; padding: 10px 12px; border: 1px solid #2a2b55;
    border-radius: 10px; background: #0f1040; color: #fff; outline: none;
  }
  .row { display: flex; gap: 8px; }
  .btn {
    flex: 1; padding: 10px 12px; border: 0; border-radius: 10px;
    background: #4c5bdc; color: #fff; font-weight: 600; cursor: pointer;
  }
  .btn.secondary { flex: 0 0 auto; background: #25275b; }
  .btn:disabled { opacity: .6; cursor: not-allowed; }
  .error { display: none; margin-top: 8px; color: #ff6b6b; font-size: 12px; text-align: center; }
</style>
</head>
<body>
<div class="card">
  <div class="brand"><div class="logo">D</div><h1>Dkron</h1></div>
  <p class="subtitle">Sign in to access the dashboard</p>
  <form id="login-form" autocomplete="on">
    <div class="field">
      <label for="username">Username</label>
      <input id="username" name="username" placeholder="Username" autocomplete="username">
    </div>
    <div class="field">
      <label for="password">Password</label>
      <div class="row">
        <input id="password" name="password" type="password" placeholder="Password" autocomplete="current-password">
        <button type="button" id="toggle" class="btn secondary" aria-label="Show password">Show</button>
      </div>
    </div>
    <div class="row"><button type="submit" id="submit" class="btn">Login</button></div>
    <div class="error" id="error"></div>
  </form>
</div>
<script>
  const form = document.getElementById('login-form');
  const submit = document.getElementById('submit');
  const error = document.getElementById('error');
  const password = document.getElementById('password');
  const toggle = document.getElementById('toggle');
  const target = '"#;

const CHALLENGE_TAIL: &str = r#"';

  toggle.addEventListener('click', function () {
    const hidden = password.type === 'password';
    password.type = hidden ? 'text' : 'password';
    toggle.textContent = hidden ? 'Hide' : 'Show';
    toggle.setAttribute('aria-label', hidden ? 'Hide password' : 'Show password');
  });

  function showError(message) {
    error.textContent = message;
    error.style.display = 'block';
  }

  form.addEventListener('submit', async function (ev) {
    ev.preventDefault();
    error.style.display = 'none';
    submit.disabled = true;
    try {
      const r = await fetch('/ui/login', {
        method: 'POST',
        headers: { 'Content-Type': 'application/json' },
        body: JSON.stringify({ username: this.username.value.trim(), password: password.value })
      });
      if (r.ok) {
        location.href = target;
      } else {
        showError('Invalid credentials');
      }
    } catch (err) {
      showError('Login error');
    } finally {
      submit.disabled = false;
    }
  });
</script>
</body>
</html>"#;
