use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rand::Rng;
use std::sync::Arc;
use swiss_pairing::{
    MatchRecord, MemoryTournamentRepository, PairingConfig, PairingEngine, PairingStrategy,
    TournamentRepository,
};
use tokio::runtime::Runtime;

/// Helper to create a store with `n_players` and some random prior rounds
fn setup_store(rt: &Runtime, n_players: usize, n_games: usize) -> Arc<MemoryTournamentRepository> {
    let names: Vec<String> = (0..n_players).map(|i| format!("player{i}")).collect();
    let names: Vec<&str> = names.iter().map(String::as_str).collect();
    let repo = Arc::new(MemoryTournamentRepository::with_players(&names));

    let mut rng = rand::rng();
    rt.block_on(async {
        for _ in 0..n_games {
            let winner = rng.random_range(1..=n_players as i32);
            let loser = rng.random_range(1..=n_players as i32);
            if winner != loser {
                repo.record_match(MatchRecord::Regular { winner, loser })
                    .await
                    .unwrap();
            }
        }
    });

    repo
}

/// Benchmark one even round per strategy (no bye side effect, so the store
/// is unchanged between iterations)
fn bench_next_round(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("next_round_pairings");

    for n_players in [8, 32, 64] {
        let repo = setup_store(&rt, n_players, n_players * 2);
        for strategy in [PairingStrategy::Greedy, PairingStrategy::Matching] {
            let engine = PairingEngine::new(repo.clone(), PairingConfig::new(strategy));
            group.bench_with_input(
                BenchmarkId::new(strategy.to_string(), n_players),
                &engine,
                |b, engine| {
                    b.to_async(&rt)
                        .iter(|| async { engine.next_round_pairings().await.unwrap() });
                },
            );
        }
    }

    group.finish();
}

/// Benchmark standings derivation over a long history
fn bench_standings(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let repo = setup_store(&rt, 128, 1000);

    c.bench_function("standings_128_players", |b| {
        b.to_async(&rt)
            .iter(|| async { repo.get_standings().await.unwrap() });
    });
}

criterion_group!(benches, bench_next_round, bench_standings);
criterion_main!(benches);
