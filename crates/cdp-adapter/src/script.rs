//! JavaScript snippets evaluated in the page.
//!
//! Every snippet resolves its selector through the same helper so CSS,
//! `text=` and `xpath=` selectors behave identically for every operation.

use action_primitives::WaitState;
use serde_json::Value;

const RESOLVE: &str = r#"
const __resolve = (sel) => {
  if (sel.startsWith('xpath=')) {
    const snap = document.evaluate(sel.slice(6), document, null,
      XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null);
    const out = [];
    for (let i = 0; i < snap.snapshotLength; i++) out.push(snap.snapshotItem(i));
    return out;
  }
  if (sel.startsWith('text=')) {
    const wanted = sel.slice(5).trim();
    const hits = Array.from(document.querySelectorAll('body *'))
      .filter((e) => (e.textContent || '').trim() === wanted);
    return hits.filter((e) => !hits.some((o) => o !== e && e.contains(o)));
  }
  return Array.from(document.querySelectorAll(sel));
};
const __visible = (el) => {
  if (!el) return false;
  const style = window.getComputedStyle(el);
  return style.visibility !== 'hidden' && style.display !== 'none'
    && el.getClientRects().length > 0;
};
const __text = (el) => ((el.innerText ?? el.textContent ?? '') + '').trim();
"#;

fn literal(value: &str) -> String {
    Value::String(value.to_string()).to_string()
}

fn with_elements(selector: &str, body: &str) -> String {
    format!(
        "(() => {{ {} const els = __resolve({}); {} }})()",
        RESOLVE,
        literal(selector),
        body
    )
}

/// Plain CSS selectors can use native element handles
pub fn is_css(selector: &str) -> bool {
    !(selector.starts_with("text=") || selector.starts_with("xpath="))
}

pub fn count(selector: &str) -> String {
    with_elements(selector, "return els.length;")
}

pub fn is_visible(selector: &str) -> String {
    with_elements(selector, "return __visible(els[0]);")
}

pub fn texts(selector: &str) -> String {
    with_elements(selector, "return els.map(__text);")
}

pub fn child_texts(parent: &str, index: usize, child: &str) -> String {
    with_elements(
        parent,
        &format!(
            "const el = els[{}]; if (!el) return []; \
             return Array.from(el.querySelectorAll({})).map(__text);",
            index,
            literal(child)
        ),
    )
}

pub fn click_nth(selector: &str, index: usize) -> String {
    with_elements(
        selector,
        &format!(
            "const el = els[{}]; if (!el) return false; \
             el.scrollIntoView({{ block: 'center' }}); el.click(); return true;",
            index
        ),
    )
}

pub fn fill(selector: &str, value: &str) -> String {
    with_elements(
        selector,
        &format!(
            "const el = els[0]; if (!el) return false; el.focus(); el.value = {}; \
             el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
             el.dispatchEvent(new Event('change', {{ bubbles: true }})); return true;",
            literal(value)
        ),
    )
}

pub fn state_reached(selector: &str, state: WaitState) -> String {
    let body = match state {
        WaitState::Attached => "return els.length > 0;",
        WaitState::Visible => "return __visible(els[0]);",
        WaitState::Hidden => "return !__visible(els[0]);",
        WaitState::Detached => "return els.length === 0;",
    };
    with_elements(selector, body)
}

pub const READY_STATE: &str = "document.readyState === 'complete'";
