//! In-memory navigator for tests.
//!
//! A [`Script`] models the automated UI as named views. Answers (counts,
//! texts, visibility, table rows) are registered per `(view, selector)`;
//! [`ANY_VIEW`] registers an answer for every view. Clicking a selector with
//! a registered transition switches the current view. Failures injected with
//! [`Script::fail`] fire for the given number of operations on that selector
//! and survive session resets.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::errors::{NavError, NavResult};
use crate::navigator::{PageNavigator, WaitState};
use crate::session::{BrowserSession, SessionFactory};
use crate::types::SessionScope;

/// Wildcard view
pub const ANY_VIEW: &str = "*";

/// Failure key for [`PageNavigator::wait_for_load`]
pub const LOAD_KEY: &str = "<load>";

/// Everything a scripted navigator was asked to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    Goto(String),
    Click { selector: String, index: usize },
    Fill { selector: String, value: String },
    Screenshot(String),
}

type Key = (String, String);

#[derive(Debug)]
struct Failure {
    selector: String,
    error: NavError,
    remaining: usize,
}

#[derive(Debug, Default)]
struct ScriptState {
    initial_view: String,
    view: String,
    url: String,
    goto_views: Vec<(String, String)>,
    transitions: HashMap<Key, String>,
    view_urls: HashMap<String, String>,
    counts: HashMap<Key, usize>,
    visible: HashMap<Key, bool>,
    texts: HashMap<Key, Vec<String>>,
    rows: HashMap<Key, Vec<Vec<String>>>,
    failures: Vec<Failure>,
    interactions: Vec<Interaction>,
    screenshot_dir: PathBuf,
    persist_screenshots: bool,
}

impl ScriptState {
    fn lookup<'a, T>(&self, map: &'a HashMap<Key, T>, selector: &str) -> Option<&'a T> {
        map.get(&(self.view.clone(), selector.to_string()))
            .or_else(|| map.get(&(ANY_VIEW.to_string(), selector.to_string())))
    }

    fn check_failure(&mut self, selector: &str) -> NavResult<()> {
        if let Some(failure) = self
            .failures
            .iter_mut()
            .find(|f| f.selector == selector && f.remaining > 0)
        {
            failure.remaining -= 1;
            return Err(failure.error.clone());
        }
        Ok(())
    }

    fn count(&self, selector: &str) -> usize {
        self.lookup(&self.counts, selector)
            .copied()
            .or_else(|| self.lookup(&self.texts, selector).map(Vec::len))
            .unwrap_or(0)
    }
}

fn key(view: &str, selector: &str) -> Key {
    (view.to_string(), selector.to_string())
}

/// Shared, cloneable script of UI answers
#[derive(Debug, Clone)]
pub struct Script {
    state: Arc<Mutex<ScriptState>>,
}

impl Script {
    pub fn new(initial_view: &str) -> Self {
        let state = ScriptState {
            initial_view: initial_view.to_string(),
            view: initial_view.to_string(),
            screenshot_dir: std::env::temp_dir(),
            ..ScriptState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Switch to `view` when navigating to a URL containing `fragment`
    pub fn on_goto(self, fragment: &str, view: &str) -> Self {
        self.state
            .lock()
            .goto_views
            .push((fragment.to_string(), view.to_string()));
        self
    }

    /// Switch from `from` (or any view) to `to` when `selector` is clicked
    pub fn on_click(self, from: &str, selector: &str, to: &str) -> Self {
        self.state
            .lock()
            .transitions
            .insert(key(from, selector), to.to_string());
        self
    }

    /// URL reported by `current_url` while `view` is shown
    pub fn url(self, view: &str, url: &str) -> Self {
        self.state
            .lock()
            .view_urls
            .insert(view.to_string(), url.to_string());
        self
    }

    pub fn count(self, view: &str, selector: &str, count: usize) -> Self {
        self.state.lock().counts.insert(key(view, selector), count);
        self
    }

    pub fn visible(self, view: &str, selector: &str, visible: bool) -> Self {
        self.state
            .lock()
            .visible
            .insert(key(view, selector), visible);
        self
    }

    pub fn texts(self, view: &str, selector: &str, texts: &[&str]) -> Self {
        self.state.lock().texts.insert(
            key(view, selector),
            texts.iter().map(|t| t.to_string()).collect(),
        );
        self
    }

    /// Child texts per parent match, read by `child_texts(parent, i, child)`
    pub fn rows(self, view: &str, parent: &str, child: &str, rows: Vec<Vec<&str>>) -> Self {
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(str::to_string).collect())
            .collect();
        self.state
            .lock()
            .rows
            .insert(key(view, &format!("{} >> {}", parent, child)), rows);
        self
    }

    /// Fail the next `times` operations on `selector` with `error`
    pub fn fail(self, selector: &str, error: NavError, times: usize) -> Self {
        self.state.lock().failures.push(Failure {
            selector: selector.to_string(),
            error,
            remaining: times,
        });
        self
    }

    /// Write empty placeholder files for screenshots
    pub fn persist_screenshots(self, persist: bool) -> Self {
        self.state.lock().persist_screenshots = persist;
        self
    }

    pub fn current_view(&self) -> String {
        self.state.lock().view.clone()
    }

    pub fn interactions(&self) -> Vec<Interaction> {
        self.state.lock().interactions.clone()
    }

    /// Clicked selectors in order
    pub fn clicks(&self) -> Vec<String> {
        self.interactions()
            .into_iter()
            .filter_map(|i| match i {
                Interaction::Click { selector, .. } => Some(selector),
                _ => None,
            })
            .collect()
    }

    /// `(selector, value)` pairs filled in order
    pub fn fills(&self) -> Vec<(String, String)> {
        self.interactions()
            .into_iter()
            .filter_map(|i| match i {
                Interaction::Fill { selector, value } => Some((selector, value)),
                _ => None,
            })
            .collect()
    }

    pub fn screenshots(&self) -> Vec<String> {
        self.interactions()
            .into_iter()
            .filter_map(|i| match i {
                Interaction::Screenshot(name) => Some(name),
                _ => None,
            })
            .collect()
    }

    fn reset_view(&self) {
        let mut state = self.state.lock();
        state.view = state.initial_view.clone();
        state.url.clear();
    }

    fn set_screenshot_dir(&self, dir: PathBuf) {
        self.state.lock().screenshot_dir = dir;
    }
}

/// [`PageNavigator`] answering from a [`Script`]
#[derive(Debug, Clone)]
pub struct ScriptedNavigator {
    script: Script,
}

impl ScriptedNavigator {
    pub fn new(script: Script) -> Self {
        Self { script }
    }

    pub fn script(&self) -> &Script {
        &self.script
    }
}

#[async_trait]
impl PageNavigator for ScriptedNavigator {
    async fn goto(&mut self, url: &str) -> NavResult<()> {
        let mut state = self.script.state.lock();
        state.check_failure(url)?;
        state.interactions.push(Interaction::Goto(url.to_string()));
        state.url = url.to_string();
        if let Some(view) = state
            .goto_views
            .iter()
            .find(|(fragment, _)| url.contains(fragment.as_str()))
            .map(|(_, view)| view.clone())
        {
            state.view = view;
        }
        Ok(())
    }

    async fn click(&mut self, selector: &str) -> NavResult<()> {
        self.click_nth(selector, 0).await
    }

    async fn click_nth(&mut self, selector: &str, index: usize) -> NavResult<()> {
        let mut state = self.script.state.lock();
        state.check_failure(selector)?;
        if index >= state.count(selector) && state.lookup(&state.counts, selector).is_some() {
            return Err(NavError::NotFound(format!("{}[{}]", selector, index)));
        }
        state.interactions.push(Interaction::Click {
            selector: selector.to_string(),
            index,
        });
        if let Some(next) = state.lookup(&state.transitions, selector).cloned() {
            state.view = next;
        }
        Ok(())
    }

    async fn fill(&mut self, selector: &str, value: &str) -> NavResult<()> {
        let mut state = self.script.state.lock();
        state.check_failure(selector)?;
        state.interactions.push(Interaction::Fill {
            selector: selector.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    async fn count(&mut self, selector: &str) -> NavResult<usize> {
        let mut state = self.script.state.lock();
        state.check_failure(selector)?;
        Ok(state.count(selector))
    }

    async fn is_visible(&mut self, selector: &str) -> NavResult<bool> {
        let mut state = self.script.state.lock();
        state.check_failure(selector)?;
        Ok(state
            .lookup(&state.visible, selector)
            .copied()
            .unwrap_or_else(|| state.count(selector) > 0))
    }

    async fn text(&mut self, selector: &str) -> NavResult<Option<String>> {
        Ok(self.texts(selector).await?.into_iter().next())
    }

    async fn texts(&mut self, selector: &str) -> NavResult<Vec<String>> {
        let mut state = self.script.state.lock();
        state.check_failure(selector)?;
        Ok(state
            .lookup(&state.texts, selector)
            .cloned()
            .unwrap_or_default())
    }

    async fn child_texts(
        &mut self,
        parent: &str,
        index: usize,
        child: &str,
    ) -> NavResult<Vec<String>> {
        let mut state = self.script.state.lock();
        state.check_failure(parent)?;
        let rows_key = format!("{} >> {}", parent, child);
        Ok(state
            .lookup(&state.rows, &rows_key)
            .and_then(|rows| rows.get(index).cloned())
            .unwrap_or_default())
    }

    async fn wait_for(
        &mut self,
        selector: &str,
        _state: WaitState,
        _timeout: Duration,
    ) -> NavResult<()> {
        self.script.state.lock().check_failure(selector)
    }

    async fn wait_for_load(&mut self, _timeout: Duration) -> NavResult<()> {
        self.script.state.lock().check_failure(LOAD_KEY)
    }

    async fn pause(&mut self, _duration: Duration) {
        tokio::task::yield_now().await;
    }

    async fn screenshot(&mut self, name: &str) -> NavResult<PathBuf> {
        let (path, persist) = {
            let mut state = self.script.state.lock();
            state.interactions.push(Interaction::Screenshot(name.to_string()));
            (
                state.screenshot_dir.join(format!("{}.png", name)),
                state.persist_screenshots,
            )
        };
        if persist {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|err| NavError::Internal(err.to_string()))?;
            }
            tokio::fs::write(&path, b"")
                .await
                .map_err(|err| NavError::Internal(err.to_string()))?;
        }
        Ok(path)
    }

    async fn current_url(&mut self) -> NavResult<String> {
        let state = self.script.state.lock();
        Ok(state
            .view_urls
            .get(&state.view)
            .cloned()
            .unwrap_or_else(|| state.url.clone()))
    }
}

/// Session lifecycle counters
#[derive(Debug, Default)]
pub struct SessionCounters {
    opened: AtomicUsize,
    resets: AtomicUsize,
    closed: AtomicUsize,
}

impl SessionCounters {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn resets(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Session over a shared [`Script`]
pub struct ScriptedSession {
    navigator: ScriptedNavigator,
    counters: Arc<SessionCounters>,
}

#[async_trait]
impl BrowserSession for ScriptedSession {
    fn navigator(&mut self) -> &mut dyn PageNavigator {
        &mut self.navigator
    }

    async fn reset(&mut self) -> NavResult<()> {
        self.counters.resets.fetch_add(1, Ordering::SeqCst);
        self.navigator.script.reset_view();
        Ok(())
    }

    async fn close(self: Box<Self>) -> NavResult<()> {
        self.counters.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Factory handing out sessions that all share one [`Script`]
#[derive(Clone)]
pub struct ScriptedSessionFactory {
    script: Script,
    counters: Arc<SessionCounters>,
    open_error: Arc<Mutex<Option<NavError>>>,
}

impl ScriptedSessionFactory {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            counters: Arc::new(SessionCounters::default()),
            open_error: Arc::new(Mutex::new(None)),
        }
    }

    /// Make every `open` fail with `error`
    pub fn failing_open(self, error: NavError) -> Self {
        *self.open_error.lock() = Some(error);
        self
    }

    pub fn script(&self) -> &Script {
        &self.script
    }

    pub fn counters(&self) -> &SessionCounters {
        &self.counters
    }
}

#[async_trait]
impl SessionFactory for ScriptedSessionFactory {
    async fn open(&self, scope: &SessionScope) -> NavResult<Box<dyn BrowserSession>> {
        if let Some(error) = self.open_error.lock().clone() {
            return Err(error);
        }
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        self.script.reset_view();
        self.script.set_screenshot_dir(scope.screenshot_dir.clone());
        Ok(Box::new(ScriptedSession {
            navigator: ScriptedNavigator::new(self.script.clone()),
            counters: self.counters.clone(),
        }))
    }
}
