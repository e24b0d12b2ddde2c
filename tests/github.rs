#[cfg(test)]
mod tests {
    use jira_kpi::api::{lookup_contributions, ContributionError, ContributionSource, GitHubClient, GitHubConfig, Quota, RetryPolicy};
    use reqwest::StatusCode;
    use serde_json::{json, Value};
    use std::time::Duration;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer, org: Option<&str>) -> GitHubClient {
        let config = GitHubConfig {
            access_token: "ghp_test".to_string(),
            api_url: server.uri(),
            org: org.map(str::to_string),
            ..Default::default()
        };
        GitHubClient::new(&config).unwrap()
    }

    fn commit_detail(sha: &str, author: &str, additions: u64, deletions: u64) -> Value {
        json!({
            "sha": sha,
            "html_url": format!("https://github.com/acme/api/commit/{}", sha),
            "commit": { "author": { "name": author, "email": "dev@example.com" }, "message": "KPI-1 fix" },
            "stats": { "additions": additions, "deletions": deletions, "total": additions + deletions }
        })
    }

    fn rate_limit_body(core: u64, search: u64) -> Value {
        json!({
            "resources": {
                "core": { "limit": 5000, "remaining": core, "reset": 1700003600, "used": 5000 - core },
                "search": { "limit": 30, "remaining": search, "reset": 1700000060, "used": 30 - search }
            }
        })
    }

    async fn mount_search(server: &MockServer, q: &str) {
        Mock::given(method("GET"))
            .and(path("/search/commits"))
            .and(query_param("q", q))
            .and(header("accept", "application/vnd.github+json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total_count": 2,
                "items": [
                    { "sha": "a1", "repository": { "full_name": "acme/api" } },
                    { "sha": "b2", "repository": { "full_name": "acme/api" } }
                ]
            })))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/api/commits/a1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(commit_detail("a1", "Bob Dev", 10, 2)))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/api/commits/b2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(commit_detail("b2", "Carol Dev", 1, 1)))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_commits_for_issue() {
        let server = MockServer::start().await;
        mount_search(&server, "KPI-1").await;

        let commits = client(&server, None).commits_for("KPI-1").await.unwrap();

        assert_eq!(commits.len(), 2);
        assert_eq!(commits[0].url, "https://github.com/acme/api/commit/a1");
        assert_eq!(commits[0].author, "Bob Dev");
        assert_eq!(commits[0].lines_added, 10);
        assert_eq!(commits[0].lines_deleted, 2);
        assert_eq!(commits[0].lines_total, 12);
        assert_eq!(commits[1].author, "Carol Dev");
    }

    #[tokio::test]
    async fn test_search_scoped_to_org() {
        let server = MockServer::start().await;
        mount_search(&server, "KPI-1 org:acme").await;
        let client = client(&server, Some("acme"));

        assert_eq!(client.search_query("KPI-1"), "KPI-1 org:acme");
        assert_eq!(client.commits_for("KPI-1").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_rate_limited_search() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/commits"))
            .respond_with(
                ResponseTemplate::new(403)
                    .insert_header("x-ratelimit-remaining", "0")
                    .insert_header("x-ratelimit-reset", "1700000060")
                    .set_body_string("API rate limit exceeded"),
            )
            .mount(&server)
            .await;

        let err = client(&server, None).commits_for("KPI-1").await.unwrap_err();

        assert!(matches!(err, ContributionError::RateLimited { reset_at: Some(1700000060) }));
    }

    #[tokio::test]
    async fn test_forbidden_without_rate_limit_is_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/commits"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let err = client(&server, None).commits_for("KPI-1").await.unwrap_err();

        match err {
            ContributionError::HttpError { status, body } => {
                assert_eq!(status, StatusCode::FORBIDDEN);
                assert_eq!(body, "forbidden");
            }
            other => panic!("expected HttpError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_remaining_quota_is_tightest() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rate_limit"))
            .respond_with(ResponseTemplate::new(200).set_body_json(rate_limit_body(4000, 0)))
            .mount(&server)
            .await;

        let quota = client(&server, None).remaining_quota().await.unwrap();

        assert_eq!(
            quota,
            Quota {
                remaining: 0,
                reset_at: Some(1700000060)
            }
        );
        assert!(quota.is_exhausted());
    }

    #[tokio::test]
    async fn test_lookup_gives_up_while_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rate_limit"))
            .respond_with(ResponseTemplate::new(200).set_body_json(rate_limit_body(4000, 12)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/search/commits"))
            .respond_with(ResponseTemplate::new(429))
            .expect(2)
            .mount(&server)
            .await;
        let policy = RetryPolicy {
            max_attempts: 1,
            cool_down: Duration::from_millis(5),
        };

        let commits = lookup_contributions(&client(&server, None), "KPI-1", &policy).await;

        assert!(commits.is_empty());
    }

    #[tokio::test]
    async fn test_lookup_returns_commits() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rate_limit"))
            .respond_with(ResponseTemplate::new(200).set_body_json(rate_limit_body(4000, 12)))
            .mount(&server)
            .await;
        mount_search(&server, "KPI-1").await;

        let commits = lookup_contributions(&client(&server, None), "KPI-1", &RetryPolicy::default()).await;

        assert_eq!(commits.len(), 2);
    }

    #[tokio::test]
    async fn test_search_reads_every_page() {
        let server = MockServer::start().await;
        for (page, items) in [
            ("1", json!([
                { "sha": "a1", "repository": { "full_name": "acme/api" } },
                { "sha": "b2", "repository": { "full_name": "acme/api" } }
            ])),
            ("2", json!([{ "sha": "c3", "repository": { "full_name": "acme/web" } }])),
        ] {
            Mock::given(method("GET"))
                .and(path("/search/commits"))
                .and(query_param("per_page", "2"))
                .and(query_param("page", page))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "total_count": 3, "items": items })))
                .expect(1)
                .mount(&server)
                .await;
        }
        for (repo, sha, author) in [("acme/api", "a1", "Bob Dev"), ("acme/api", "b2", "Bob Dev"), ("acme/web", "c3", "Carol Dev")] {
            Mock::given(method("GET"))
                .and(path(format!("/repos/{}/commits/{}", repo, sha)))
                .respond_with(ResponseTemplate::new(200).set_body_json(commit_detail(sha, author, 1, 1)))
                .mount(&server)
                .await;
        }

        let commits = client(&server, None).with_page_size(2).commits_for("KPI-1").await.unwrap();

        assert_eq!(commits.len(), 3);
        assert_eq!(commits[2].author, "Carol Dev");
    }

    #[tokio::test]
    async fn test_search_requests_full_pages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/commits"))
            .and(query_param("per_page", "100"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "total_count": 0, "items": [] })))
            .expect(1)
            .mount(&server)
            .await;

        let commits = client(&server, None).commits_for("KPI-1").await.unwrap();

        assert!(commits.is_empty());
    }
}
