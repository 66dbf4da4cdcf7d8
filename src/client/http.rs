use super::{ClientError, SchedulerClient};
use crate::config::Config;
use crate::model::{Job, JobStat, SchedulerStats};
use log::debug;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;

const API_PATH: [&str; 2] = ["api", "v1"];

#[derive(Deserialize)]
struct CreatedResponse {
    id: String,
}

#[derive(Deserialize)]
struct JobResponse {
    job: Job,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JobCollection {
    ById(BTreeMap<String, Job>),
    List(Vec<Job>),
}

#[derive(Deserialize)]
struct JobsResponse {
    #[serde(default)]
    jobs: Option<JobCollection>,
}

#[derive(Deserialize)]
struct JobStatsResponse {
    #[serde(default)]
    job_stats: Option<Vec<JobStat>>,
}

#[derive(Deserialize)]
struct SchedulerStatsResponse {
    #[serde(rename = "Stats")]
    stats: SchedulerStats,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

/// Scheduler client that talks JSON over HTTP
pub struct HttpClient {
    http: Client,
    base_url: Url,
}

impl HttpClient {
    pub fn new(config: &Config) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        let mut base_url = config.endpoint.clone();
        base_url
            .path_segments_mut()
            .map_err(|()| ClientError::InvalidEndpoint(config.endpoint.to_string()))?
            .pop_if_empty()
            .extend(API_PATH);
        Ok(Self { http, base_url })
    }

    /// Build the URL of an API resource. Every segment is percent-encoded and
    /// the path always ends with a slash.
    fn url(&self, segments: &[&str]) -> Result<Url, ClientError> {
        // Dot segments would be resolved away and address a different resource
        if let Some(segment) = segments
            .iter()
            .find(|segment| matches!(**segment, "" | "." | ".."))
        {
            return Err(ClientError::InvalidJobId((*segment).to_owned()));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidEndpoint(self.base_url.to_string()))?
            .extend(segments)
            .push("");
        Ok(url)
    }

    /// Send a request and return the response status and body, translating
    /// non-success statuses into errors
    fn send(&self, request: RequestBuilder) -> Result<(StatusCode, String), ClientError> {
        let response = request.send()?;
        let status = response.status();
        debug!("{} {}", status.as_u16(), response.url());
        let body = response.text()?;

        if status == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound {
                message: service_message(&body).unwrap_or_else(|| "Job not found".to_owned()),
            });
        }
        if !status.is_success() {
            return Err(ClientError::Service {
                status: status.as_u16(),
                message: service_message(&body).unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("Unknown error")
                        .to_owned()
                }),
            });
        }

        Ok((status, body))
    }

    fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ClientError> {
        let url = self.url(segments)?;
        debug!("GET {url}");
        let (_, body) = self.send(self.http.get(url))?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Extract the human-readable message from an error response body
fn service_message(body: &str) -> Option<String> {
    if let Ok(ErrorResponse { error }) = serde_json::from_str(body) {
        return Some(error);
    }
    let body = body.trim();
    (!body.is_empty()).then(|| body.to_owned())
}

impl SchedulerClient for HttpClient {
    fn create_job(&self, job: &Job) -> Result<String, ClientError> {
        let url = self.url(&["job"])?;
        debug!("POST {url}");
        let (_, body) = self.send(self.http.post(url).json(job))?;
        let created: CreatedResponse = serde_json::from_str(&body)?;
        Ok(created.id)
    }

    fn delete_job(&self, id: &str) -> Result<bool, ClientError> {
        let url = self.url(&["job", id])?;
        debug!("DELETE {url}");
        // Any answer from the scheduler is a result here, only transport failures are errors
        let response = self.http.delete(url).send()?;
        let status = response.status();
        debug!("{} {}", status.as_u16(), response.url());
        if status == StatusCode::NO_CONTENT {
            return Ok(true);
        }

        let body = response.text().unwrap_or_default();
        debug!(
            "Scheduler refused to delete job {id}: {}",
            service_message(&body).unwrap_or_else(|| status.to_string())
        );
        Ok(false)
    }

    fn get_job(&self, id: &str) -> Result<Job, ClientError> {
        let response: JobResponse = self.get(&["job", id])?;
        Ok(response.job)
    }

    fn list_jobs(&self) -> Result<Vec<Job>, ClientError> {
        let response: JobsResponse = self.get(&["job"])?;
        Ok(match response.jobs {
            None => vec![],
            Some(JobCollection::List(jobs)) => jobs,
            Some(JobCollection::ById(jobs)) => jobs
                .into_iter()
                .map(|(id, mut job)| {
                    if job.id.is_empty() {
                        job.id = id;
                    }
                    job
                })
                .collect(),
        })
    }

    fn get_job_stats(&self, id: &str) -> Result<Vec<JobStat>, ClientError> {
        let response: JobStatsResponse = self.get(&["job", "stats", id])?;
        Ok(response.job_stats.unwrap_or_default())
    }

    fn get_scheduler_stats(&self) -> Result<SchedulerStats, ClientError> {
        let response: SchedulerStatsResponse = self.get(&["stats"])?;
        Ok(response.stats)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use std::net::TcpListener;

    use super::*;
    use crate::client::test_server::serve_once;

    #[test]
    fn test_create_job() {
        let (config, server) = serve_once("201 Created", r#"{"id":"abc123"}"#);
        let client = HttpClient::new(&config).unwrap();
        let job = Job {
            name: "backup".to_owned(),
            schedule: "@every 1h".to_owned(),
            command: "tar czf /bk".to_owned(),
            retries: 3,
            ..Default::default()
        };
        assert_eq!(client.create_job(&job).unwrap(), "abc123");

        let received = server.join().unwrap();
        assert_eq!(received.request_line, "POST /api/v1/job/ HTTP/1.1");
        let sent: Job = serde_json::from_str(&received.body).unwrap();
        assert_eq!(sent, job);
    }

    #[test]
    fn test_delete_job() {
        let (config, server) = serve_once("204 No Content", "");
        let client = HttpClient::new(&config).unwrap();
        assert!(client.delete_job("abc123").unwrap());
        assert_eq!(
            server.join().unwrap().request_line,
            "DELETE /api/v1/job/abc123/ HTTP/1.1"
        );
    }

    #[test]
    fn test_delete_job_refused() {
        let (config, _server) = serve_once("200 OK", "");
        let client = HttpClient::new(&config).unwrap();
        assert!(!client.delete_job("abc123").unwrap());
    }

    #[test]
    fn test_delete_unknown_job() {
        let (config, server) = serve_once("404 Not Found", "");
        let client = HttpClient::new(&config).unwrap();
        assert!(!client.delete_job("missing-id").unwrap());
        assert_eq!(
            server.join().unwrap().request_line,
            "DELETE /api/v1/job/missing-id/ HTTP/1.1"
        );
    }

    #[test]
    fn test_delete_job_server_error() {
        let (config, _server) = serve_once("500 Internal Server Error", r#"{"error":"locked"}"#);
        let client = HttpClient::new(&config).unwrap();
        assert!(!client.delete_job("abc123").unwrap());
    }

    #[test]
    fn test_job_id_is_encoded() {
        let (config, server) = serve_once("200 OK", r#"{"job":{"id":"a?b#c"}}"#);
        let client = HttpClient::new(&config).unwrap();
        assert_eq!(client.get_job("a?b#c").unwrap().id, "a?b#c");
        assert_eq!(
            server.join().unwrap().request_line,
            "GET /api/v1/job/a%3Fb%23c/ HTTP/1.1"
        );

        let (config, server) = serve_once("204 No Content", "");
        let client = HttpClient::new(&config).unwrap();
        assert!(client.delete_job("stats/x").unwrap());
        assert_eq!(
            server.join().unwrap().request_line,
            "DELETE /api/v1/job/stats%2Fx/ HTTP/1.1"
        );
    }

    #[test]
    fn test_dot_job_ids_rejected() {
        let client = HttpClient::new(&Config::mock()).unwrap();
        for id in ["", ".", ".."] {
            assert_matches!(client.delete_job(id), Err(ClientError::InvalidJobId(invalid)) => {
                assert_eq!(invalid, id);
            });
            assert_matches!(client.get_job_stats(id), Err(ClientError::InvalidJobId(_)));
        }
    }

    #[test]
    fn test_get_job_not_found() {
        let (config, _server) = serve_once("404 Not Found", r#"{"error":"Job not found"}"#);
        let client = HttpClient::new(&config).unwrap();
        assert_matches!(client.get_job("missing-id"), Err(ClientError::NotFound { message }) => {
            assert_eq!(message, "Job not found");
        });
    }

    #[test]
    fn test_service_error_message() {
        let (config, _server) = serve_once("400 Bad Request", "Schedule is invalid\n");
        let client = HttpClient::new(&config).unwrap();
        assert_matches!(
            client.create_job(&Job::default()),
            Err(ClientError::Service { status: 400, message }) => {
                assert_eq!(message, "Schedule is invalid");
            }
        );
    }

    #[test]
    fn test_service_error_without_body() {
        let (config, _server) = serve_once("500 Internal Server Error", "");
        let client = HttpClient::new(&config).unwrap();
        assert_matches!(
            client.get_scheduler_stats(),
            Err(ClientError::Service { status: 500, message }) => {
                assert_eq!(message, "Internal Server Error");
            }
        );
    }

    #[test]
    fn test_malformed_body() {
        let (config, _server) = serve_once("200 OK", "<html></html>");
        let client = HttpClient::new(&config).unwrap();
        assert_matches!(client.get_job("abc123"), Err(ClientError::Decode(_)));
    }

    #[test]
    fn test_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut config = Config::mock();
        config.endpoint = format!("http://{addr}").parse().unwrap();
        let client = HttpClient::new(&config).unwrap();
        assert_matches!(client.list_jobs(), Err(ClientError::Transport(_)));
    }

    #[test]
    fn test_list_jobs_by_id() {
        let (config, server) = serve_once(
            "200 OK",
            r#"{"jobs":{"b":{"name":"second"},"a":{"id":"a","name":"first"}}}"#,
        );
        let client = HttpClient::new(&config).unwrap();
        let ids = client
            .list_jobs()
            .unwrap()
            .into_iter()
            .map(|job| job.id)
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(
            server.join().unwrap().request_line,
            "GET /api/v1/job/ HTTP/1.1"
        );
    }

    #[test]
    fn test_list_jobs_array_keeps_order() {
        let (config, _server) = serve_once(
            "200 OK",
            r#"{"jobs":[{"id":"c"},{"id":"a"},{"id":"b"}]}"#,
        );
        let client = HttpClient::new(&config).unwrap();
        let ids = client
            .list_jobs()
            .unwrap()
            .into_iter()
            .map(|job| job.id)
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_list_jobs_empty() {
        let (config, _server) = serve_once("200 OK", r#"{"jobs":{}}"#);
        let client = HttpClient::new(&config).unwrap();
        assert!(client.list_jobs().unwrap().is_empty());
    }

    #[test]
    fn test_get_job_stats() {
        let (config, server) = serve_once(
            "200 OK",
            r#"{"job_stats":[{"JobId":"abc123","Success":true},{"JobId":"abc123","Success":false}]}"#,
        );
        let client = HttpClient::new(&config).unwrap();
        let stats = client.get_job_stats("abc123").unwrap();
        assert_eq!(
            stats.iter().map(|stat| stat.success).collect::<Vec<_>>(),
            vec![true, false]
        );
        assert_eq!(
            server.join().unwrap().request_line,
            "GET /api/v1/job/stats/abc123/ HTTP/1.1"
        );
    }

    #[test]
    fn test_get_scheduler_stats() {
        let (config, server) = serve_once("200 OK", r#"{"Stats":{"Jobs":4,"ActiveJobs":3}}"#);
        let client = HttpClient::new(&config).unwrap();
        let stats = client.get_scheduler_stats().unwrap();
        assert_eq!(stats.jobs, 4);
        assert_eq!(stats.active_jobs, 3);
        assert_eq!(
            server.join().unwrap().request_line,
            "GET /api/v1/stats/ HTTP/1.1"
        );
    }

    #[test]
    fn test_endpoint_with_path() {
        let (mut config, server) = serve_once("200 OK", r#"{"job":{"id":"abc123"}}"#);
        config.endpoint = config.endpoint.join("kala").unwrap();
        let client = HttpClient::new(&config).unwrap();
        assert_eq!(client.get_job("abc123").unwrap().id, "abc123");
        assert_eq!(
            server.join().unwrap().request_line,
            "GET /kala/api/v1/job/abc123/ HTTP/1.1"
        );
    }
}
