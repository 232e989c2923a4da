//! Read-only course catalogue.

use std::collections::BTreeMap;

use fairway_sim::Course;

use crate::error::CatalogError;

const BUILTIN_COURSES: &str = include_str!("../courses/builtin.json");

/// Source of course data for a session.
///
/// Lookups are synchronous and never fail loudly; a missing course is
/// `None` and the orchestrator reports it to whoever asked.
pub trait CourseCatalog: Send + Sync {
    fn get_course(&self, id: &str) -> Option<Course>;

    /// Every course, in catalogue order.
    fn list_courses(&self) -> Vec<Course>;
}

/// An in-memory catalogue.
#[derive(Debug, Clone, Default)]
pub struct StaticCourseCatalog {
    /// Insertion order.
    order: Vec<String>,
    courses: BTreeMap<String, Course>,
}

impl StaticCourseCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON array of courses.
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let courses: Vec<Course> = serde_json::from_str(json)?;
        let mut catalog = Self::new();
        for course in courses {
            catalog.insert(course)?;
        }
        Ok(catalog)
    }

    /// The courses shipped with the server.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json_str(BUILTIN_COURSES)
    }

    pub fn insert(&mut self, course: Course) -> Result<(), CatalogError> {
        if course.holes.is_empty() {
            return Err(CatalogError::EmptyCourse(course.id));
        }
        if self.courses.contains_key(&course.id) {
            return Err(CatalogError::DuplicateCourse(course.id));
        }
        self.order.push(course.id.clone());
        self.courses.insert(course.id.clone(), course);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl CourseCatalog for StaticCourseCatalog {
    fn get_course(&self, id: &str) -> Option<Course> {
        self.courses.get(id).cloned()
    }

    fn list_courses(&self) -> Vec<Course> {
        self.order
            .iter()
            .filter_map(|id| self.courses.get(id))
            .cloned()
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
