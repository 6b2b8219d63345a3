use crate::view::{Container, VOTE_TEXT_ATTR, VOTED_TEXT_ATTR};

pub fn render_index() -> String {
    let widget = Container::widget(true)
        .with_attribute(VOTE_TEXT_ATTR, "Vote for this project")
        .with_attribute(VOTED_TEXT_ATTR, "Thanks for voting!");
    INDEX_HTML.replace("{{WIDGET}}", &widget.to_html())
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Vote Widget</title>
  <style>
    :root {
      --bg-1: #f8f3e6;
      --ink: #2b2a28;
      --accent: #ff6b4a;
      --accent-2: #2f4858;
      --card: rgba(255, 255, 255, 0.86);
      --shadow: 0 24px 60px rgba(47, 72, 88, 0.18);
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: linear-gradient(135deg, var(--bg-1), #ffe9d4 60%, #f9f2e9 100%);
      color: var(--ink);
      font-family: "Trebuchet MS", sans-serif;
      display: grid;
      place-items: center;
    }

    #vote-widget {
      background: var(--card);
      border-radius: 28px;
      box-shadow: var(--shadow);
      padding: 28px 36px;
      display: flex;
      align-items: center;
      gap: 16px;
    }

    .vote-btn {
      appearance: none;
      border: none;
      border-radius: 999px;
      width: 56px;
      height: 56px;
      font-size: 1.5rem;
      cursor: pointer;
      background: var(--accent);
      color: white;
      transition: transform 150ms ease;
    }

    .vote-btn:active {
      transform: scale(0.96);
    }

    .vote-btn:disabled {
      cursor: default;
      opacity: 0.8;
    }

    .vote-btn.voted {
      background: var(--accent-2);
    }

    .vote-count,
    .visitor-count {
      font-size: 1.6rem;
      font-weight: 600;
      color: var(--accent-2);
    }

    .visitor-count::after {
      content: " visitors";
      font-size: 0.85rem;
      font-weight: 400;
    }
  </style>
</head>
<body>
  {{WIDGET}}
  <script src="/static/counter-app.js"></script>
  <script src="/static/counter-database.js"></script>
</body>
</html>
"#;

/// Base module: the browser's client for the counter API.
pub const APP_SCRIPT: &str = r#"(function () {
  const counterUrl = (path) => '/api/counters/' + path;

  const readJson = async (response) => {
    if (!response.ok) {
      throw new Error('counter store answered ' + response.status);
    }
    return response.json();
  };

  window.counterApp = {
    read(path, after, wait) {
      const query = after === undefined ? '' : '?after=' + after + '&wait=' + wait;
      return fetch(counterUrl(path) + query).then(readJson).then((body) => body.value);
    },
    increment(path) {
      return fetch(counterUrl(path) + '/increment', { method: 'POST' })
        .then(readJson)
        .then((body) => body.value);
    },
    subscribe(path, onUpdate) {
      let last;
      const poll = async () => {
        for (;;) {
          try {
            const value = await this.read(path, last, 25);
            if (value !== last) {
              onUpdate(value);
            }
            last = value;
          } catch (error) {
            console.warn('live update failed, retrying', error);
            await new Promise((resolve) => setTimeout(resolve, 1000));
          }
        }
      };
      poll();
    },
  };
})();
"#;

/// Database module: the widget state machine bound to `#vote-widget`.
pub const DATABASE_SCRIPT: &str = r#"(function () {
  const VOTED_KEY = 'onekh_voted';
  const VISITED_KEY = 'onekh_visited';

  const flags = {
    get(key) {
      try {
        return localStorage.getItem(key) === 'true';
      } catch (error) {
        return false;
      }
    },
    set(key) {
      try {
        localStorage.setItem(key, 'true');
      } catch (error) {
        console.warn('failed to store flag', key, error);
      }
    },
  };

  const formatCount = (n) => {
    const tenths = (value, unit) => Math.floor(value / unit) + (value % unit >= unit / 2 ? 1 : 0);
    const withSuffix = (t, suffix) => Math.floor(t / 10) + '.' + (t % 10) + suffix;
    if (n >= 1000000) return withSuffix(tenths(n, 100000), 'M');
    if (n >= 1000) return withSuffix(tenths(n, 100), 'K');
    return String(n);
  };

  const widget = {
    state: 'loading',
    voted: flags.get(VOTED_KEY),
    visited: flags.get(VISITED_KEY),
    voting: false,
    voteCount: 0,
    visitorCount: 0,

    render() {
      const container = document.getElementById('vote-widget');
      if (!container || this.state === 'error') return;
      const button = container.querySelector('.vote-btn');
      const voteCount = container.querySelector('.vote-count');
      const visitorCount = container.querySelector('.visitor-count');
      const voteText = container.querySelector('.vote-text');

      if (voteCount) voteCount.textContent = formatCount(this.voteCount);
      if (visitorCount) visitorCount.textContent = formatCount(this.visitorCount);
      if (button) {
        if (this.state === 'loading') {
          button.disabled = true;
          button.textContent = '⏳';
        } else if (this.voted) {
          button.disabled = true;
          button.textContent = '✓';
          button.classList.add('voted');
        } else {
          button.disabled = false;
          button.textContent = '👍';
        }
      }
      if (voteText) {
        voteText.textContent = this.voted
          ? container.getAttribute('data-voted-text') || 'Thanks for voting!'
          : container.getAttribute('data-vote-text') || 'Vote for this project';
      }
    },

    async init() {
      this.render();
      const api = window.counterApp;
      if (!api) {
        this.state = 'error';
        const container = document.getElementById('vote-widget');
        if (container) {
          container.innerHTML = '<p style="color: #888; font-size: 0.9rem;">Widget unavailable</p>';
        }
        return;
      }
      if (!this.visited) {
        try {
          await api.increment('visitors/total');
          this.visited = true;
          flags.set(VISITED_KEY);
        } catch (error) {
          console.warn('failed to count visitor', error);
        }
      }
      api.subscribe('votes/total', (value) => {
        this.voteCount = value;
        this.render();
      });
      api.subscribe('visitors/total', (value) => {
        this.visitorCount = value;
        this.render();
      });
      this.state = 'ready';
      this.render();
    },

    async castVote() {
      if (this.voted || this.voting || this.state !== 'ready') return;
      this.voting = true;
      try {
        await window.counterApp.increment('votes/total');
        this.voted = true;
        flags.set(VOTED_KEY);
        this.render();
      } catch (error) {
        alert('Failed to submit vote. Please try again.');
      } finally {
        this.voting = false;
      }
    },
  };

  const start = () => {
    widget.init();
    const button = document.querySelector('#vote-widget .vote-btn');
    if (button) {
      button.addEventListener('click', () => widget.castVote());
    }
  };

  if (document.readyState === 'loading') {
    document.addEventListener('DOMContentLoaded', start);
  } else {
    start();
  }
})();
"#;
