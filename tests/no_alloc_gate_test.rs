use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use shiro_tgm::core::{Game, ModeConfig, SessionSnapshot};
use shiro_tgm::term::{FrameBuffer, GameView, Viewport};
use shiro_tgm::types::{GameAction, InputEvent};

struct CountingAlloc;

static COUNT_ENABLED: AtomicBool = AtomicBool::new(false);
static ALLOC_COUNT: AtomicUsize = AtomicUsize::new(0);

#[global_allocator]
static GLOBAL: CountingAlloc = CountingAlloc;

unsafe impl GlobalAlloc for CountingAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        if COUNT_ENABLED.load(Ordering::Relaxed) {
            ALLOC_COUNT.fetch_add(1, Ordering::Relaxed);
        }
        System.alloc(layout)
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout)
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        if COUNT_ENABLED.load(Ordering::Relaxed) {
            ALLOC_COUNT.fetch_add(1, Ordering::Relaxed);
        }
        System.realloc(ptr, layout, new_size)
    }
}

fn with_alloc_counting<F: FnOnce()>(f: F) -> usize {
    ALLOC_COUNT.store(0, Ordering::Relaxed);
    COUNT_ENABLED.store(true, Ordering::Relaxed);
    f();
    COUNT_ENABLED.store(false, Ordering::Relaxed);
    ALLOC_COUNT.load(Ordering::Relaxed)
}

const SCRIPT: [InputEvent; 8] = [
    InputEvent::Press(GameAction::MoveLeft),
    InputEvent::Press(GameAction::RotateCw),
    InputEvent::Release(GameAction::RotateCw),
    InputEvent::Release(GameAction::MoveLeft),
    InputEvent::Press(GameAction::Hold),
    InputEvent::Release(GameAction::Hold),
    InputEvent::Press(GameAction::SonicDrop),
    InputEvent::Release(GameAction::SonicDrop),
];

// Tests in this file share the counting allocator, so the whole gate runs
// inside one test.
#[test]
fn frame_loop_hot_paths_do_not_allocate() {
    for mode in [ModeConfig::master(), ModeConfig::versus(), ModeConfig::twenty_g()] {
        // Setup (outside counting) so one-time allocations don't trip the gate.
        let mut game = Game::new(mode, 2024).unwrap();
        let view = GameView::default();
        let viewport = Viewport::new(120, 30);
        let mut snap = SessionSnapshot::default();
        let mut fb = FrameBuffer::new(viewport.width, viewport.height);

        // Warm-up.
        game.frame();
        game.snapshot_into(&mut snap);
        view.render_into(&snap, viewport, &mut fb);

        let allocs = with_alloc_counting(|| {
            for frame in 0..2000usize {
                let event = SCRIPT[frame % SCRIPT.len()];
                if frame % 3 == 0 {
                    game.input(&[event]);
                }
                game.input_player(1, &[event]);
                game.frame();
                game.snapshot_into(&mut snap);
                view.render_into(&snap, viewport, &mut fb);
            }
        });

        assert_eq!(allocs, 0, "{} allocations in mode {}", allocs, game.mode().name);
    }
}
