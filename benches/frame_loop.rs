use criterion::{black_box, criterion_group, criterion_main, Criterion};
use shiro_tgm::core::{Board, Game, ModeConfig, Playfield, SessionSnapshot};
use shiro_tgm::term::{FrameBuffer, GameView, Viewport};
use shiro_tgm::types::{GameAction, InputEvent, PieceKind, CELL_MONO};

fn bench_frame(c: &mut Criterion) {
    let mut game = Game::new(ModeConfig::master(), 12345).unwrap();

    c.bench_function("session_frame", |b| {
        b.iter(|| {
            game.frame();
            if game.is_over() {
                game.restart();
            }
        })
    });
}

fn bench_frame_versus_20g(c: &mut Criterion) {
    let mode = ModeConfig {
        speed_curve: ModeConfig::twenty_g().speed_curve,
        ..ModeConfig::versus()
    };
    let mut game = Game::new(mode, 12345).unwrap();
    let drop = [
        InputEvent::Press(GameAction::SonicDrop),
        InputEvent::Release(GameAction::SonicDrop),
    ];

    c.bench_function("session_frame_versus_20g", |b| {
        b.iter(|| {
            game.input_player(1, black_box(&drop));
            game.frame();
            if game.is_over() {
                game.restart();
            }
        })
    });
}

fn bench_line_clear(c: &mut Criterion) {
    c.bench_function("commit_and_collapse_4_lines", |b| {
        b.iter(|| {
            let mut board = Board::new();
            for y in 16..20 {
                for x in 1..10 {
                    board.set(x, y, CELL_MONO);
                }
            }
            let piece = shiro_tgm::core::ActivePiece {
                rotation: shiro_tgm::types::Rotation::East,
                ..shiro_tgm::core::ActivePiece::new(PieceKind::I, -2, 16)
            };
            let cleared = board.commit(black_box(&piece));
            board.collapse_cleared_rows();
            cleared.len()
        })
    });
}

fn bench_snapshot_and_render(c: &mut Criterion) {
    let mut game = Game::new(ModeConfig::versus(), 12345).unwrap();
    game.frame();
    let view = GameView::default();
    let viewport = Viewport::new(120, 30);
    let mut snap = SessionSnapshot::default();
    let mut fb = FrameBuffer::new(viewport.width, viewport.height);

    c.bench_function("snapshot_and_render", |b| {
        b.iter(|| {
            game.snapshot_into(&mut snap);
            view.render_into(black_box(&snap), viewport, &mut fb);
        })
    });
}

criterion_group!(
    benches,
    bench_frame,
    bench_frame_versus_20g,
    bench_line_clear,
    bench_snapshot_and_render
);
criterion_main!(benches);
