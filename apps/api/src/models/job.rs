use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: String,
    pub title: String,
    pub description: String,
    pub location: String,
    pub salary: String,
    pub posted_date: String,
}

/// Read-only list of open positions, built once at startup.
#[derive(Debug, Clone)]
pub struct JobCatalog {
    jobs: Vec<JobPosting>,
}

impl JobCatalog {
    pub fn new(jobs: Vec<JobPosting>) -> Self {
        Self { jobs }
    }

    /// The positions this service currently advertises.
    pub fn builtin() -> Self {
        Self::new(vec![
            posting(
                "1",
                "Software Engineer",
                "Developing web applications using modern frameworks",
                "San Francisco",
                "$120,000 - $150,000",
                "2025-03-15",
            ),
            posting(
                "2",
                "Data Scientist",
                "Analyzing large datasets and building ML models",
                "Remote",
                "$130,000 - $160,000",
                "2025-03-20",
            ),
            posting(
                "3",
                "UX Designer",
                "Creating user-centered designs for web and mobile applications",
                "New York",
                "$100,000 - $130,000",
                "2025-03-25",
            ),
        ])
    }

    pub fn all(&self) -> &[JobPosting] {
        &self.jobs
    }

    pub fn get(&self, id: &str) -> Option<&JobPosting> {
        self.jobs.iter().find(|j| j.id == id)
    }

    pub fn ids(&self) -> Vec<String> {
        self.jobs.iter().map(|j| j.id.clone()).collect()
    }
}

fn posting(
    id: &str,
    title: &str,
    description: &str,
    location: &str,
    salary: &str,
    posted_date: &str,
) -> JobPosting {
    JobPosting {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        location: location.to_string(),
        salary: salary.to_string(),
        posted_date: posted_date.to_string(),
    }
}
