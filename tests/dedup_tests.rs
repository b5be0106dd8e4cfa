use std::collections::BTreeSet;

use futures::StreamExt;

use ybuster::gather::wayback::{write_parsed, ParsedUrl};
use ybuster::gather::wordlist::url_candidates;
use ybuster::gather::{normalize, normalize_file};

fn corpus() -> Vec<String> {
    let mut out = Vec::new();
    for host in ["a.test", "b.test:8080"] {
        for path in ["/", "/search", "/api/v1/users", "/img/banner.PNG", "/docs/manual.pdf"] {
            out.push(format!("http://{}{}", host, path));
            for query in ["?id=1", "?id=2", "?id=3&page=4", "?page=1&id=9", "?q=x"] {
                out.push(format!("http://{}{}{}", host, path, query));
            }
        }
    }
    out.push("::not a url::".into());
    out
}

#[test]
fn no_two_outputs_share_host_path_and_keys() {
    let out = normalize(corpus());
    let keys: Vec<_> = out.iter().map(|u| ParsedUrl::parse(u)).map(|p| (p.host, p.path, p.query)).collect();
    let distinct: BTreeSet<_> = keys.iter().cloned().collect();
    assert_eq!(keys.len(), distinct.len());
}

#[test]
fn normalizing_twice_changes_nothing() {
    let once = normalize(corpus());
    let twice = normalize(&once);
    assert_eq!(once.iter().collect::<BTreeSet<_>>(), twice.iter().collect::<BTreeSet<_>>());
}

#[test]
fn search_variants_collapse_by_key_set() {
    let out = normalize(corpus());
    let search: Vec<_> = out.iter().filter(|u| u.starts_with("http://a.test/search")).collect();
    // no query, {id}, {id,page}, {q}
    assert_eq!(search.len(), 4);
}

#[test]
fn asset_urls_fold_into_their_directory() {
    let out = normalize(["http://h/img/pic.jpg?ver=3", "http://h/img/other.gif", "http://h/img/"]);
    assert_eq!(out, vec!["http://h/img/"]);
}

#[tokio::test]
async fn corpus_file_is_normalized_persisted_and_streamed() {
    let dir = tempfile::tempdir().unwrap();
    let corpus = dir.path().join("wayback.txt");
    std::fs::write(
        &corpus,
        "# archived\nhttp://h/a?x=1\n\nhttp://h/a?x=2\nhttp://h/b?y=1\nhttp://h/logo.png\n",
    )
    .unwrap();

    let urls = normalize_file(&corpus).unwrap();
    // sorted input order; the logo folds into the site root
    assert_eq!(urls, vec!["http://h/a?x=1", "http://h/b?y=1", "http://h/"]);

    let written = write_parsed(dir.path(), "http://h/", &urls).unwrap();
    assert!(written.starts_with(dir.path().join("output_waybackurls")));
    let name = written.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("waybackurls_parsed_") && name.ends_with("_http_h.txt"));
    assert_eq!(std::fs::read_to_string(&written).unwrap(), "http://h/a?x=1\nhttp://h/b?y=1\nhttp://h/\n");

    let candidates: Vec<_> = url_candidates(urls).collect().await;
    assert_eq!(candidates.len(), 3);
    assert!(candidates.iter().all(|c| c.pre_resolved));
}

#[test]
fn missing_corpus_is_a_corpus_error() {
    let err = normalize_file(std::path::Path::new("/definitely/not/here.txt")).unwrap_err();
    assert!(matches!(err, ybuster::BusterError::Corpus { .. }));
}
