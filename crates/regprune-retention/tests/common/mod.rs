//! Common test helpers for regprune-retention integration tests
//!
//! Provides a recording in-memory registry:
//! - Scripted project directory and per-project image listings
//! - Scripted listing and deletion failures
//! - A log of every call for verification

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use regprune_core::types::{Image, Page, PageRequest, Project};
use regprune_registry::{RegistryApi, RegistryError, Result};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// The instant every test measures ages from
#[allow(dead_code)]
pub fn test_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

/// A tagged image with a digest, pushed `days` before `test_now()`
#[allow(dead_code)]
pub fn image(tag: &str, digest: &str, days: i64) -> Image {
    Image::tagged(tag)
        .with_digest(digest)
        .with_pushed_at(test_now() - Duration::days(days))
}

#[derive(Debug, Default)]
struct FakeState {
    projects: Vec<Project>,
    images: HashMap<String, Vec<Image>>,
    failing_project_listing: bool,
    failing_image_listings: HashSet<String>,
    failing_deletes: HashSet<(String, usize)>,
    list_calls: Vec<(String, PageRequest)>,
    delete_calls: Vec<(String, Vec<String>)>,
}

/// In-memory registry that records its calls
///
/// Page tokens are offsets into the stored listing. Clones share state, so a
/// test can hand one clone to the engine and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct FakeRegistry {
    state: Arc<Mutex<FakeState>>,
}

#[allow(dead_code)]
impl FakeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_project(self, project: Project, images: Vec<Image>) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.images.insert(project.project_id.clone(), images);
            state.projects.push(project);
        }
        self
    }

    /// Images for a project that is not in the directory
    pub fn with_images(self, project_id: &str, images: Vec<Image>) -> Self {
        self.state
            .lock()
            .unwrap()
            .images
            .insert(project_id.to_string(), images);
        self
    }

    pub fn fail_project_listing(self) -> Self {
        self.state.lock().unwrap().failing_project_listing = true;
        self
    }

    pub fn fail_image_listing(self, project_id: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_image_listings
            .insert(project_id.to_string());
        self
    }

    /// Fail the `index`th (0-based) delete call made for `project_id`
    pub fn fail_delete_call(self, project_id: &str, index: usize) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_deletes
            .insert((project_id.to_string(), index));
        self
    }

    pub fn delete_calls(&self) -> Vec<(String, Vec<String>)> {
        self.state.lock().unwrap().delete_calls.clone()
    }

    pub fn delete_calls_for(&self, project_id: &str) -> Vec<Vec<String>> {
        self.delete_calls()
            .into_iter()
            .filter(|(p, _)| p == project_id)
            .map(|(_, tags)| tags)
            .collect()
    }

    pub fn list_calls_for(&self, project_id: &str) -> Vec<PageRequest> {
        self.state
            .lock()
            .unwrap()
            .list_calls
            .iter()
            .filter(|(p, _)| p == project_id)
            .map(|(_, r)| r.clone())
            .collect()
    }

    /// Assert no mutating call was made
    pub fn assert_no_deletes(&self) {
        let calls = self.delete_calls();
        assert!(
            calls.is_empty(),
            "expected no delete calls, got {:?}",
            calls
        );
    }
}

fn paginate<T: Clone>(items: &[T], request: &PageRequest) -> Result<Page<T>> {
    let offset = match request.page_token.as_deref() {
        None => 0,
        Some(token) => token
            .parse::<usize>()
            .map_err(|_| RegistryError::api("List", 400, None, "bad page token"))?,
    };
    let end = (offset + request.page_size as usize).min(items.len());
    let next = (end < items.len()).then(|| end.to_string());
    Ok(Page::new(items[offset.min(end)..end].to_vec(), next))
}

#[async_trait]
impl RegistryApi for FakeRegistry {
    async fn list_projects(&self, request: PageRequest) -> Result<Page<Project>> {
        let mut state = self.state.lock().unwrap();
        state.list_calls.push(("<projects>".to_string(), request.clone()));
        if state.failing_project_listing {
            return Err(RegistryError::api("ListProjects", 503, None, "unavailable"));
        }
        paginate(&state.projects, &request)
    }

    async fn list_images(&self, project_id: &str, request: PageRequest) -> Result<Page<Image>> {
        let mut state = self.state.lock().unwrap();
        state.list_calls.push((project_id.to_string(), request.clone()));
        if state.failing_image_listings.contains(project_id) {
            return Err(RegistryError::transport("connection reset by peer"));
        }
        let images = state.images.get(project_id).cloned().unwrap_or_default();
        paginate(&images, &request)
    }

    async fn delete_images(&self, project_id: &str, image_tags: &[String]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let index = state
            .delete_calls
            .iter()
            .filter(|(p, _)| p == project_id)
            .count();
        state
            .delete_calls
            .push((project_id.to_string(), image_tags.to_vec()));
        if state
            .failing_deletes
            .contains(&(project_id.to_string(), index))
        {
            return Err(RegistryError::api("DeleteImage", 500, None, "internal error"));
        }
        Ok(())
    }
}
