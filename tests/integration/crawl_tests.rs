//! End-to-end crawl scenarios against mock HTTP servers

use crate::helpers::{crawl_site, mount_head_ok, mount_page, page_with_links, test_config};
use linkatlas::config::Environment;
use linkatlas::crawler::{process_task, Crawler, ScopedClient};
use linkatlas::queue::CrawlTask;
use linkatlas::robots::RobotsPolicy;
use linkatlas::storage::{Compressor, GraphStore};
use linkatlas::url::netloc;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn host_of(server: &MockServer) -> String {
    netloc(&Url::parse(&server.uri()).unwrap()).unwrap()
}

#[tokio::test]
async fn test_trivial_site_single_node_no_file() {
    let server = MockServer::start().await;
    mount_head_ok(&server).await;
    mount_page(&server, "/", &page_with_links(&[])).await;

    let dir = TempDir::new().unwrap();
    let store = GraphStore::new(dir.path(), Compressor::Gzip).unwrap();

    let start = Url::parse(&format!("{}/", server.uri())).unwrap();
    let config = test_config(dir.path());
    let client = ScopedClient::for_origin(&start, &config, Environment::Development).unwrap();
    let mut crawler = Crawler::new(client, RobotsPolicy::allow_all(), 5, 10);

    assert!(crawler.pre_crawl_setup(&start).await);
    crawler.build_graph(&start).await;

    assert_eq!(crawler.graph().node_count(), 1);
    assert_eq!(crawler.graph().edge_count(), 0);

    // one lonely node is below the persistence threshold
    let saved = crawler.compress_graph(&host_of(&server), &store).unwrap();
    assert!(saved.is_none());
    assert!(store.list().unwrap().is_empty());
}

#[tokio::test]
async fn test_two_page_loop() {
    let server = MockServer::start().await;
    mount_head_ok(&server).await;
    mount_page(&server, "/", &page_with_links(&["/a"])).await;
    mount_page(&server, "/a", &page_with_links(&["/b"])).await;
    mount_page(&server, "/b", &page_with_links(&["/a"])).await;

    let graph = crawl_site(&server.uri(), 5, RobotsPolicy::allow_all()).await;

    let base = server.uri();
    assert!(graph.contains_node(&format!("{}/a", base)));
    assert!(graph.contains_node(&format!("{}/b", base)));
    assert_eq!(graph.node_count(), 3); // "/", "/a", "/b"
                                       // the a<->b loop collapses to one undirected edge
    assert_eq!(graph.edge_count(), 2);
}

#[tokio::test]
async fn test_loop_persists_and_roundtrips() {
    let server = MockServer::start().await;
    mount_head_ok(&server).await;
    mount_page(&server, "/", &page_with_links(&["/a", "/b"])).await;
    mount_page(&server, "/a", &page_with_links(&["/b"])).await;
    mount_page(&server, "/b", &page_with_links(&["/a"])).await;

    let dir = TempDir::new().unwrap();
    let store = GraphStore::new(dir.path(), Compressor::Gzip).unwrap();

    let start = Url::parse(&format!("{}/", server.uri())).unwrap();
    let config = test_config(dir.path());
    let client = ScopedClient::for_origin(&start, &config, Environment::Development).unwrap();
    let mut crawler = Crawler::new(client, RobotsPolicy::allow_all(), 5, 10);
    assert!(crawler.pre_crawl_setup(&start).await);
    crawler.build_graph(&start).await;

    let host = host_of(&server);
    let saved = crawler.compress_graph(&host, &store).unwrap();
    assert!(saved.is_some());

    // the decompressed document holds every edge endpoint as a node
    let data = store.read_document(&saved.unwrap()).unwrap();
    assert!(!data.directed);
    for edge in &data.edges {
        assert!(data.nodes.iter().any(|n| n.id == edge.source));
        assert!(data.nodes.iter().any(|n| n.id == edge.target));
    }

    let loaded = store.load(&host).unwrap();
    assert_eq!(loaded.node_count(), crawler.graph().node_count());
    assert_eq!(loaded.edge_count(), crawler.graph().edge_count());
}

#[tokio::test]
async fn test_external_links_filtered() {
    let server = MockServer::start().await;
    mount_head_ok(&server).await;
    mount_page(
        &server,
        "/",
        &page_with_links(&["https://other.test/x", "/b"]),
    )
    .await;
    mount_page(&server, "/b", &page_with_links(&[])).await;

    let graph = crawl_site(&server.uri(), 5, RobotsPolicy::allow_all()).await;

    assert!(graph.contains_node(&format!("{}/b", server.uri())));
    assert!(!graph.contains_node("https://other.test/x"));
    assert_eq!(graph.edge_count(), 1);

    // every edge endpoint shares the start URL's network location
    let origin = host_of(&server);
    for node in graph.nodes() {
        let url = Url::parse(node).unwrap();
        assert_eq!(netloc(&url).unwrap(), origin);
    }
}

#[tokio::test]
async fn test_depth_cap_on_linear_chain() {
    let server = MockServer::start().await;
    mount_head_ok(&server).await;
    mount_page(&server, "/", &page_with_links(&["/1"])).await;
    mount_page(&server, "/1", &page_with_links(&["/2"])).await;
    mount_page(&server, "/2", &page_with_links(&["/3"])).await;
    mount_page(&server, "/3", &page_with_links(&["/4"])).await;
    mount_page(&server, "/4", &page_with_links(&[])).await;

    let graph = crawl_site(&server.uri(), 2, RobotsPolicy::allow_all()).await;

    let base = server.uri();
    assert!(graph.contains_node(&format!("{}/", base)));
    assert!(graph.contains_node(&format!("{}/1", base)));
    assert!(graph.contains_node(&format!("{}/2", base)));
    // beyond the cap: not even present as nodes
    assert!(!graph.contains_node(&format!("{}/3", base)));
    assert!(!graph.contains_node(&format!("{}/4", base)));
    assert_eq!(graph.edge_count(), 2);
}

#[tokio::test]
async fn test_depth_zero_yields_single_node() {
    let server = MockServer::start().await;
    mount_head_ok(&server).await;
    mount_page(&server, "/", &page_with_links(&["/a", "/b"])).await;

    let graph = crawl_site(&server.uri(), 0, RobotsPolicy::allow_all()).await;

    assert_eq!(graph.node_count(), 1);
    assert_eq!(graph.edge_count(), 0);
}

#[tokio::test]
async fn test_robots_disallowed_page_stays_leaf() {
    let server = MockServer::start().await;
    mount_head_ok(&server).await;
    mount_page(&server, "/", &page_with_links(&["/a"])).await;
    mount_page(&server, "/a", &page_with_links(&["/admin/x"])).await;
    mount_page(&server, "/admin/x", &page_with_links(&["/admin/secret"])).await;

    let robots = RobotsPolicy::from_content("User-agent: *\nDisallow: /admin");
    let graph = crawl_site(&server.uri(), 5, robots).await;

    let base = server.uri();
    // the disallowed page was fetched once (check is post-fetch) and is a
    // node, but none of its links were extracted
    assert!(graph.contains_node(&format!("{}/admin/x", base)));
    assert!(!graph.contains_node(&format!("{}/admin/secret", base)));
    assert!(graph
        .neighbors(&format!("{}/admin/x", base))
        .iter()
        .all(|n| *n == format!("{}/a", base)));
}

#[tokio::test]
async fn test_excluded_suffix_is_node_but_never_fetched() {
    let server = MockServer::start().await;
    mount_head_ok(&server).await;
    mount_page(&server, "/", &page_with_links(&["/doc.pdf", "/b"])).await;
    mount_page(&server, "/b", &page_with_links(&[])).await;

    // the pdf must never be requested
    Mock::given(method("GET"))
        .and(path("/doc.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_string("pdf bytes"))
        .expect(0)
        .mount(&server)
        .await;

    let graph = crawl_site(&server.uri(), 5, RobotsPolicy::allow_all()).await;

    let pdf = format!("{}/doc.pdf", server.uri());
    assert!(graph.contains_node(&pdf));
    // reachable as an endpoint, but never expanded
    assert_eq!(graph.neighbors(&pdf), vec![format!("{}/", server.uri())]);
}

#[tokio::test]
async fn test_non_html_content_is_a_leaf() {
    let server = MockServer::start().await;
    mount_head_ok(&server).await;
    mount_page(&server, "/", &page_with_links(&["/data"])).await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"links": ["/hidden"]}"#)
                .insert_header("content-type", "application/json"),
        )
        .mount(&server)
        .await;

    let graph = crawl_site(&server.uri(), 5, RobotsPolicy::allow_all()).await;

    assert!(graph.contains_node(&format!("{}/data", server.uri())));
    assert!(!graph.contains_node(&format!("{}/hidden", server.uri())));
}

#[tokio::test]
async fn test_failed_fetch_prunes_subtree_only() {
    let server = MockServer::start().await;
    mount_head_ok(&server).await;
    mount_page(&server, "/", &page_with_links(&["/gone", "/alive"])).await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_page(&server, "/alive", &page_with_links(&["/deeper"])).await;
    mount_page(&server, "/deeper", &page_with_links(&[])).await;

    let graph = crawl_site(&server.uri(), 5, RobotsPolicy::allow_all()).await;

    let base = server.uri();
    // the failing URL stays as a leaf node; its sibling subtree is intact
    assert!(graph.contains_node(&format!("{}/gone", base)));
    assert!(graph.contains_node(&format!("{}/deeper", base)));
}

#[tokio::test]
async fn test_each_page_fetched_once() {
    let server = MockServer::start().await;
    mount_head_ok(&server).await;
    // every page links to every other page
    mount_page(&server, "/", &page_with_links(&["/a", "/b"])).await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(page_with_links(&["/", "/b"]))
                .insert_header("content-type", "text/html"),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(page_with_links(&["/", "/a"]))
                .insert_header("content-type", "text/html"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let graph = crawl_site(&server.uri(), 5, RobotsPolicy::allow_all()).await;
    assert_eq!(graph.node_count(), 3);
    // the full triangle
    assert_eq!(graph.edge_count(), 3);
}

#[tokio::test]
async fn test_start_url_error_aborts_without_file() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let store = GraphStore::new(dir.path(), Compressor::Gzip).unwrap();
    let config = test_config(dir.path());

    let start = Url::parse(&format!("{}/", server.uri())).unwrap();
    let task = CrawlTask::new(start, Compressor::Gzip, 5, 10).unwrap();
    process_task(&task, &config, Environment::Development, &store)
        .await
        .unwrap_or_else(|e| {
            panic!("task should abort cleanly, got {}", e);
        });

    assert!(store.list().unwrap().is_empty());
}

#[tokio::test]
async fn test_process_task_persists_graph() {
    let server = MockServer::start().await;
    mount_head_ok(&server).await;
    // robots.txt is fetched first; unmatched GETs return 404 which yields
    // the permissive policy
    mount_page(&server, "/", &page_with_links(&["/a"])).await;
    mount_page(&server, "/a", &page_with_links(&["/"])).await;

    let dir = TempDir::new().unwrap();
    let store = GraphStore::new(dir.path(), Compressor::Gzip).unwrap();
    let config = test_config(dir.path());

    let start = Url::parse(&format!("{}/", server.uri())).unwrap();
    let task = CrawlTask::new(start, Compressor::Gzip, 5, 10).unwrap();
    process_task(&task, &config, Environment::Development, &store)
        .await
        .unwrap();

    let hosts = store.list_hosts().unwrap();
    assert_eq!(hosts, vec![host_of(&server)]);

    let graph = store.load(&hosts[0]).unwrap();
    assert_eq!(graph.node_count(), 2);
    assert_eq!(graph.edge_count(), 1);
}
