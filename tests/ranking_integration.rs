use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use prodrank::config::{ApiConfig, DataConfig, RankingConfig};
use prodrank::{Config, Error, InteractionModel, InteractionRecord, RankingEngine, Recommender};

fn config_for(path: PathBuf) -> Config {
    Config {
        data: DataConfig { path },
        api: ApiConfig {
            port: 8080,
            host: "127.0.0.1".to_string(),
            request_timeout: Duration::from_secs(5),
            cors_enabled: false,
        },
        ranking: RankingConfig::default(),
    }
}

fn write_records(file: &mut tempfile::NamedTempFile, json: &str) {
    let handle = file.as_file_mut();
    handle.set_len(0).unwrap();
    std::io::Seek::rewind(handle).unwrap();
    handle.write_all(json.as_bytes()).unwrap();
    handle.flush().unwrap();
}

fn sample_records() -> Vec<InteractionRecord> {
    let mut records = Vec::new();
    let users = ["u1", "u2", "u3", "u4", "u5", "u6"];
    let catalogue = [
        ("p1", "shoes"),
        ("p2", "shoes"),
        ("p3", "hats"),
        ("p4", "hats"),
        ("p5", "bags"),
        ("p6", "bags"),
        ("p7", "socks"),
    ];
    for (u, user) in users.iter().enumerate() {
        for (p, (product, category)) in catalogue.iter().enumerate() {
            // Sparse, deterministic pattern of scores
            let score = ((u * 3 + p * 5) % 7) as f64;
            if score > 2.0 {
                records.push(InteractionRecord::new(*user, *product, *category, score));
            }
        }
    }
    records
}

#[test]
fn personalized_ranking_properties_hold_for_every_user() {
    let records = sample_records();
    let engine = RankingEngine::new(InteractionModel::build(&records).unwrap());
    let model = engine.model();

    for user in model.users.ids() {
        for n in 0..=9 {
            let ranking = engine.rank(user, n);
            assert!(ranking.len() <= n);
            assert_eq!(ranking.len(), n.min(model.product_count()));

            let mut deduped = ranking.clone();
            deduped.sort();
            deduped.dedup();
            assert_eq!(deduped.len(), ranking.len(), "ranking has duplicates");

            assert_eq!(ranking, engine.rank(user, n));
        }
    }

    assert!(engine.rank("ghost", 5).is_empty());
}

#[test]
fn similarity_matrix_is_symmetric_with_unit_diagonal() {
    let records = sample_records();
    let engine = RankingEngine::new(InteractionModel::build(&records).unwrap());
    let sim = engine.similarity();

    for i in 0..sim.nrows() {
        assert_eq!(sim[[i, i]], 1.0);
        for j in 0..sim.ncols() {
            assert_eq!(sim[[i, j]], sim[[j, i]]);
        }
    }
}

#[test]
fn global_ranking_is_bounded_known_and_stable() {
    let records = sample_records();
    let engine = RankingEngine::new(InteractionModel::build(&records).unwrap());
    let known = engine.model().products.ids().to_vec();

    for k in 0..=10 {
        let top = engine.top_global(k);
        assert!(top.len() <= k);
        assert!(top.iter().all(|p| known.contains(p)));
    }

    let sequential = RankingEngine::new(InteractionModel::build(&records).unwrap())
        .with_vote_settings(5, false)
        .top_global(7);
    assert_eq!(engine.top_global(7), sequential);
}

#[test]
fn all_zero_scores_rank_in_first_seen_order() {
    let records = vec![
        InteractionRecord::new("a", "p2", "x", 0.0),
        InteractionRecord::new("b", "p1", "y", 0.0),
        InteractionRecord::new("b", "p3", "x", 0.0),
    ];
    let engine = RankingEngine::new(InteractionModel::build(&records).unwrap());

    assert_eq!(engine.rank("a", 3), vec!["p2", "p1", "p3"]);
    assert_eq!(engine.top_global(3), vec!["p2", "p1", "p3"]);
}

#[tokio::test]
async fn recommender_loads_from_file_and_reloads() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write_records(
        &mut file,
        r#"[
            {"user_id": "A", "product_id": "P1", "category": "shoes", "interaction_score": 5},
            {"user_id": "B", "product_id": "P1", "category": "shoes", "interaction_score": 4},
            {"user_id": "B", "product_id": "P2", "category": "hats", "interaction_score": 1}
        ]"#,
    );

    let recommender = Recommender::load(&config_for(file.path().to_path_buf()))
        .await
        .unwrap();
    assert_eq!(recommender.stats().await.model.users, 2);
    assert_eq!(
        recommender.get_personalized_ranking("A", 2).await.unwrap(),
        vec!["P1", "P2"]
    );

    write_records(
        &mut file,
        r#"[
            {"user_id": "A", "product_id": "P1", "category": "shoes", "interaction_score": 5},
            {"user_id": "C", "product_id": "P3", "category": "bags", "interaction_score": 2}
        ]"#,
    );
    let stats = recommender.reload().await.unwrap();
    assert_eq!(stats.records, 2);
    assert!(recommender
        .get_personalized_ranking("B", 5)
        .await
        .unwrap()
        .is_empty());

    // A broken file leaves the current model in place
    write_records(&mut file, "not json");
    assert!(matches!(recommender.reload().await, Err(Error::Json(_))));
    assert_eq!(recommender.stats().await.records, 2);
}

#[tokio::test]
async fn empty_record_file_is_fatal() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write_records(&mut file, "[]");

    let result = Recommender::load(&config_for(file.path().to_path_buf())).await;
    assert!(matches!(result, Err(Error::EmptyDataset)));
}
