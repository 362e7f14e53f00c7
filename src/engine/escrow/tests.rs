use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::thread;

use super::*;

fn recording_escrow() -> (TextureEscrow<u32>, Arc<Mutex<Vec<u32>>>) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = log.clone();
    let escrow = TextureEscrow::new(move |item| sink.lock().unwrap().push(item));
    (escrow, log)
}

#[derive(Default)]
struct ScriptedFences {
    signaled: HashSet<u64>,
    waited: Vec<u64>,
    deleted: Vec<u64>,
}

impl FenceSync for ScriptedFences {
    fn poll_fence(&mut self, fence: GpuFence) -> bool {
        self.signaled.contains(&fence.0)
    }

    fn wait_fence(&mut self, fence: GpuFence) {
        self.waited.push(fence.0);
    }

    fn delete_fence(&mut self, fence: GpuFence) {
        self.deleted.push(fence.0);
    }
}

#[test]
fn fetch_yields_latest_and_recycles_superseded_once() {
    let (escrow, recycled) = recording_escrow();
    for texture in 1..=5 {
        escrow.submit(texture);
    }

    let mut out = None;
    assert!(escrow.fetch_and_release(&mut out));
    assert_eq!(out, Some(5));
    assert_eq!(*recycled.lock().unwrap(), vec![1, 2, 3, 4]);
}

#[test]
fn empty_fetch_keeps_current() {
    let (escrow, recycled) = recording_escrow();
    let mut out = None;
    assert!(!escrow.fetch_and_release(&mut out));
    assert_eq!(out, None);

    escrow.submit(10);
    assert!(escrow.fetch_and_release(&mut out));
    assert!(!escrow.fetch_and_release(&mut out));
    assert_eq!(out, Some(10));
    assert_eq!(escrow.current(), Some(10));
    assert!(recycled.lock().unwrap().is_empty());
}

#[test]
fn previous_current_is_released_on_next_fetch() {
    let (escrow, recycled) = recording_escrow();
    let mut out = None;

    escrow.submit(1);
    escrow.fetch_and_release(&mut out);
    escrow.submit(2);
    assert_eq!(*recycled.lock().unwrap(), Vec::<u32>::new());
    escrow.fetch_and_release(&mut out);

    assert_eq!(out, Some(2));
    assert_eq!(*recycled.lock().unwrap(), vec![1]);
}

#[test]
fn resubmitting_current_texture_is_not_recycled() {
    let (escrow, recycled) = recording_escrow();
    let mut out = None;

    escrow.submit(1);
    escrow.fetch_and_release(&mut out);
    escrow.submit(1);
    assert!(escrow.fetch_and_release(&mut out));
    escrow.submit(1);
    escrow.submit(2);

    assert_eq!(out, Some(1));
    assert!(recycled.lock().unwrap().is_empty());
}

#[test]
fn unsignaled_fence_defers_exchange() {
    let (escrow, recycled) = recording_escrow();
    let mut fences = ScriptedFences::default();
    let mut out = None;

    escrow.submit_with_fence(1, GpuFence(100));
    assert!(!escrow.fetch_signaled_and_release(&mut out, &mut fences));
    assert_eq!(out, None);
    assert!(escrow.has_pending());

    fences.signaled.insert(100);
    assert!(escrow.fetch_signaled_and_release(&mut out, &mut fences));
    assert_eq!(out, Some(1));
    assert_eq!(fences.deleted, vec![100]);
    assert!(recycled.lock().unwrap().is_empty());
}

#[test]
fn superseded_fences_are_deleted_by_the_consumer() {
    let (escrow, recycled) = recording_escrow();
    let mut fences = ScriptedFences::default();
    fences.signaled.insert(300);
    let mut out = None;

    escrow.submit_with_fence(1, GpuFence(100));
    escrow.submit_with_fence(2, GpuFence(200));
    escrow.submit_with_fence(3, GpuFence(300));
    assert!(escrow.fetch_signaled_and_release(&mut out, &mut fences));

    assert_eq!(out, Some(3));
    assert_eq!(*recycled.lock().unwrap(), vec![1, 2]);
    let mut deleted = fences.deleted.clone();
    deleted.sort_unstable();
    assert_eq!(deleted, vec![100, 200, 300]);
}

#[test]
fn gpu_wait_fetch_never_polls() {
    let (escrow, _recycled) = recording_escrow();
    let mut fences = ScriptedFences::default();
    let mut out = None;

    escrow.submit_with_fence(4, GpuFence(40));
    assert!(escrow.fetch_and_release_with_gpu_wait(&mut out, &mut fences));
    assert_eq!(out, Some(4));
    assert_eq!(fences.waited, vec![40]);
    assert_eq!(fences.deleted, vec![40]);
}

#[test]
fn drain_recycles_pending_and_current() {
    let (escrow, recycled) = recording_escrow();
    let mut out = None;

    escrow.submit(1);
    escrow.fetch_and_release(&mut out);
    escrow.submit(2);
    escrow.drain();

    let mut recycled = recycled.lock().unwrap().clone();
    recycled.sort_unstable();
    assert_eq!(recycled, vec![1, 2]);
    assert!(!escrow.has_pending());
    assert_eq!(escrow.current(), None);
}

#[test]
fn panicking_recycler_leaves_state_consistent() {
    let escrow = Arc::new(TextureEscrow::new(|item: u32| {
        if item == 1 {
            panic!("pool rejected texture");
        }
    }));

    escrow.submit(1);
    let submitter = escrow.clone();
    let result = thread::spawn(move || submitter.submit(2)).join();
    assert!(result.is_err());

    let mut out = None;
    assert!(escrow.fetch_and_release(&mut out));
    assert_eq!(out, Some(2));
}

#[test]
fn concurrent_producer_never_double_recycles() {
    let (escrow, recycled) = recording_escrow();
    let escrow = Arc::new(escrow);
    const SUBMISSIONS: u32 = 2_000;

    let producer = {
        let escrow = escrow.clone();
        thread::spawn(move || {
            for texture in 1..=SUBMISSIONS {
                escrow.submit(texture);
            }
        })
    };

    let mut out = None;
    let mut fetched = Vec::new();
    while !producer.is_finished() || escrow.has_pending() {
        if escrow.fetch_and_release(&mut out) {
            fetched.push(out.unwrap());
        }
    }
    producer.join().unwrap();

    assert!(fetched.windows(2).all(|pair| pair[0] < pair[1]));
    assert_eq!(out, Some(SUBMISSIONS));

    let recycled = recycled.lock().unwrap();
    let unique: HashSet<u32> = recycled.iter().copied().collect();
    assert_eq!(unique.len(), recycled.len());
    assert_eq!(recycled.len() as u32, SUBMISSIONS - 1);
    assert!(!unique.contains(&SUBMISSIONS));
}
