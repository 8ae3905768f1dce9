//! Parallel decoder engine: one supervisor task owning the coefficient
//! matrix, a pool of workers owning disjoint column ranges of the payload
//! matrix.
//!
//! The supervisor performs every coefficient-side row operation itself and
//! enqueues one work item per operation to every worker; each worker replays
//! the operation on its own columns of the payload rows. Work channels are
//! strict FIFO, so a worker's view of the payload trails the coefficient
//! matrix by exactly its unprocessed queue, and draining the queues
//! resynchronises the two.

use super::matrix::Matrix;
use crate::CodingError;
use crate::coded_piece::{CodedPiece, Piece};
use crate::common::gf256::Gf256;
use crate::common::vecops::{gf256_inplace_mul_vec_by_scalar, gf256_mul_vec_by_scalar_then_add_into_vec};
use crossbeam_channel::{Receiver, Sender, bounded, select};
use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::thread::{self, JoinHandle};

/// Payload columns served per worker before another worker pays off.
const COLUMNS_PER_WORKER: usize = 32;

/// Row operations replayed by workers on their column range of the payload
/// matrix. `Stop` is the last item a worker ever receives.
#[derive(Clone, Copy, Debug)]
enum WorkItem {
    /// `coded[dst][k] ^= weight * coded[src][k]`
    SubAfterMult { src: usize, dst: usize, weight: u8 },
    /// `coded[dst][k] = coded[src][k] / weight`
    Division { src: usize, dst: usize, weight: u8 },
    Stop,
}

enum Request {
    AddPiece {
        coded_piece: CodedPiece,
        reply: Sender<Result<(), CodingError>>,
    },
    GetPiece {
        piece_index: usize,
        reply: Sender<Result<Piece, CodingError>>,
    },
}

/// Payload matrix shared between the supervisor and the workers.
///
/// The lock guards the row *structure*: appending and dropping rows takes
/// the write half and happens only on the supervisor. Row bytes sit in
/// per-byte `UnsafeCell`s reached under the read half; a worker only ever
/// forms slices over its own column range of a row, the ranges are disjoint,
/// so no byte is aliased mutably.
struct PayloadMatrix {
    rows: RwLock<Vec<Vec<UnsafeCell<u8>>>>,
}

// Safety: cell bytes are only accessed under the read lock, partitioned by
// the disjoint per-worker column ranges (one exclusive owner each). The
// supervisor reads whole rows only after all issued work has drained.
unsafe impl Sync for PayloadMatrix {}

impl PayloadMatrix {
    fn with_row_capacity(capacity: usize) -> Self {
        PayloadMatrix {
            rows: RwLock::new(Vec::with_capacity(capacity)),
        }
    }

    fn push_row(&self, row: Vec<u8>) {
        let row = row.into_iter().map(UnsafeCell::new).collect();
        self.rows.write().unwrap().push(row);
    }

    fn drop_last_row(&self) {
        self.rows.write().unwrap().pop();
    }

    fn copy_row(&self, idx: usize) -> Vec<u8> {
        let rows = self.rows.read().unwrap();
        rows[idx].iter().map(|cell| unsafe { *cell.get() }).collect()
    }
}

/// `&[UnsafeCell<u8>]` and `&[u8]` share a layout; these views re-type a
/// worker's exclusive column range. Callers guarantee no other live
/// reference overlaps the range.
unsafe fn range_of(row: &[UnsafeCell<u8>], start: usize, end: usize) -> &[u8] {
    unsafe { std::slice::from_raw_parts(row[start..end].as_ptr().cast::<u8>(), end - start) }
}

#[allow(clippy::mut_from_ref)]
unsafe fn range_of_mut(row: &[UnsafeCell<u8>], start: usize, end: usize) -> &mut [u8] {
    unsafe { std::slice::from_raw_parts_mut(row[start..end].as_ptr().cast::<u8>().cast_mut(), end - start) }
}

struct Worker {
    work_rx: Receiver<WorkItem>,
    shutdown_rx: Receiver<()>,
    coded: Arc<PayloadMatrix>,
    column_start: usize,
    column_end: usize,
    /// Work items this worker has fully applied.
    drained: Arc<AtomicUsize>,
    /// Workers that have consumed their `Stop` sentinel.
    stopped_workers: Arc<AtomicUsize>,
}

impl Worker {
    fn run(self) {
        loop {
            select! {
                recv(self.work_rx) -> item => {
                    let Ok(item) = item else { break };

                    match item {
                        WorkItem::SubAfterMult { src, dst, weight } => {
                            self.sub_after_mult(src, dst, weight);
                            self.drained.fetch_add(1, Ordering::Release);
                        }
                        WorkItem::Division { src, dst, weight } => {
                            debug_assert_eq!(src, dst);
                            self.division(dst, weight);
                            self.drained.fetch_add(1, Ordering::Release);
                        }
                        WorkItem::Stop => {
                            self.stopped_workers.fetch_add(1, Ordering::Release);
                            break;
                        }
                    }
                }
                // Never carries a message; completes on disconnect i.e. cancellation.
                recv(self.shutdown_rx) -> _ => break,
            }
        }
    }

    fn sub_after_mult(&self, src: usize, dst: usize, weight: u8) {
        debug_assert_ne!(src, dst);

        let rows = self.coded.rows.read().unwrap();
        // Rows referenced by queued work are never dropped, see `admit`; the
        // column range is this worker's alone, and src != dst keeps the two
        // slices disjoint.
        let (src_range, dst_range) = unsafe {
            (
                range_of(&rows[src], self.column_start, self.column_end),
                range_of_mut(&rows[dst], self.column_start, self.column_end),
            )
        };

        gf256_mul_vec_by_scalar_then_add_into_vec(dst_range, src_range, weight);
    }

    fn division(&self, row: usize, weight: u8) {
        // The supervisor only divides by a pivot it verified to be non-zero.
        let inv = Gf256::new(weight).inv().unwrap().get();

        let rows = self.coded.rows.read().unwrap();
        let dst_range = unsafe { range_of_mut(&rows[row], self.column_start, self.column_end) };

        gf256_inplace_mul_vec_by_scalar(dst_range, inv);
    }
}

struct Supervisor {
    piece_count: usize,
    piece_byte_len: usize,
    coeffs: Matrix,
    coded: Arc<PayloadMatrix>,
    req_rx: Receiver<Request>,
    shutdown_rx: Receiver<()>,
    work_txs: Vec<Sender<WorkItem>>,
    /// Work items sent so far, to every worker alike.
    issued: usize,
    drained: Vec<Arc<AtomicUsize>>,
    useful: Arc<AtomicUsize>,
    received: Arc<AtomicUsize>,
}

impl Supervisor {
    fn run(mut self) {
        loop {
            select! {
                recv(self.req_rx) -> request => match request {
                    Err(_) => break,
                    Ok(Request::AddPiece { coded_piece, reply }) => {
                        let result = self.admit(coded_piece);
                        let _ = reply.send(result);
                    }
                    Ok(Request::GetPiece { piece_index, reply }) => {
                        let result = self.read_piece(piece_index);
                        let _ = reply.send(result);
                    }
                },
                recv(self.shutdown_rx) -> _ => break,
            }
        }
    }

    /// Admits one coded piece.
    ///
    /// Invariant: surviving rows always carry their pivot on the diagonal —
    /// row `j` has a 1 at column `j` and zeros at every other column `< rank`.
    /// Forward elimination below therefore needs only the diagonal weights,
    /// and a new row whose diagonal entry vanishes after elimination is
    /// dropped as linearly dependent (a conservative judgment that keeps the
    /// invariant; the caller simply feeds another piece).
    fn admit(&mut self, coded_piece: CodedPiece) -> Result<(), CodingError> {
        if coded_piece.pieces_coded_together() != self.piece_count || coded_piece.piece_byte_len() != self.piece_byte_len {
            return Err(CodingError::CodedPieceSizeMismatch);
        }
        if self.useful.load(Ordering::Acquire) >= self.piece_count {
            return Err(CodingError::AllUsefulPiecesReceived);
        }

        let CodedPiece { vector, piece } = coded_piece;
        self.coeffs.push_row(vector);
        self.coded.push_row(piece);
        self.received.fetch_add(1, Ordering::Release);

        let idx = self.coeffs.rows() - 1;

        // Forward elimination against every earlier row, on coefficients
        // only. The matching payload operations are buffered and flushed
        // once the piece is known to be useful, so a dropped piece leaves no
        // work referencing its (removed) row.
        let mut pending = Vec::with_capacity(2 * idx + 1);
        for j in 0..idx {
            let weight = self.coeffs[idx][j];
            if weight == 0 {
                continue;
            }

            pending.push(WorkItem::SubAfterMult { src: j, dst: idx, weight });
            self.coeffs.mul_row_then_add_into(j, idx, j, weight);
        }

        let pivot = self.coeffs[idx][idx];
        if pivot == 0 {
            self.coeffs.pop_row();
            self.coded.drop_last_row();
            self.useful.store(self.coeffs.rows(), Ordering::Release);
            return Ok(());
        }

        pending.push(WorkItem::Division {
            src: idx,
            dst: idx,
            weight: pivot,
        });
        let pivot_inv = Gf256::new(pivot).inv().unwrap().get();
        self.coeffs.scale_row_from(idx, idx, pivot_inv);

        // Clear column `idx` above the new pivot.
        for j in 0..idx {
            let weight = self.coeffs[j][idx];
            if weight == 0 {
                continue;
            }

            pending.push(WorkItem::SubAfterMult { src: idx, dst: j, weight });
            self.coeffs.mul_row_then_add_into(idx, j, idx, weight);
        }

        self.useful.store(self.coeffs.rows(), Ordering::Release);

        for item in pending {
            self.broadcast(item)?;
            self.issued += 1;
        }

        if self.coeffs.rows() == self.piece_count {
            self.broadcast(WorkItem::Stop)?;
        }

        Ok(())
    }

    /// Sends one work item to every worker, FIFO per channel. Bails out with
    /// a cancellation error if the shutdown channel closes while a queue is
    /// full.
    fn broadcast(&self, item: WorkItem) -> Result<(), CodingError> {
        for work_tx in &self.work_txs {
            select! {
                send(work_tx, item) -> result => {
                    result.map_err(|_| CodingError::DecodingCancelled)?;
                }
                recv(self.shutdown_rx) -> _ => return Err(CodingError::DecodingCancelled),
            }
        }
        Ok(())
    }

    fn read_piece(&self, piece_index: usize) -> Result<Piece, CodingError> {
        if piece_index >= self.piece_count {
            return Err(CodingError::PieceOutOfBound);
        }
        if piece_index >= self.coeffs.rows() {
            return Err(CodingError::PieceNotDecodedYet);
        }

        // The payload snapshot must reflect every coefficient operation
        // performed so far.
        self.wait_for_drain()?;

        if self.coeffs.rows() >= self.piece_count {
            return Ok(self.coded.copy_row(piece_index));
        }

        let row = &self.coeffs[piece_index];
        let revealed = row.iter().enumerate().all(|(k, &coeff)| if k == piece_index { coeff == 1 } else { coeff == 0 });
        if revealed {
            Ok(self.coded.copy_row(piece_index))
        } else {
            Err(CodingError::PieceNotDecodedYet)
        }
    }

    fn wait_for_drain(&self) -> Result<(), CodingError> {
        for drained in &self.drained {
            while drained.load(Ordering::Acquire) < self.issued {
                if matches!(self.shutdown_rx.try_recv(), Err(crossbeam_channel::TryRecvError::Disconnected)) {
                    return Err(CodingError::DecodingCancelled);
                }
                thread::yield_now();
            }
        }
        Ok(())
    }
}

/// Decoder engine that offloads payload row operations onto a worker pool
/// while a single supervisor task owns all coefficient-matrix mutation.
///
/// `add_piece` and `get_piece` are request/response calls into the
/// supervisor's queue; completions are totally ordered by the supervisor's
/// consumption order, and a `get_piece` observes the effect of every
/// `add_piece` that completed before it was enqueued.
#[derive(Debug)]
pub struct ParallelDecoderState {
    piece_count: usize,
    piece_byte_len: usize,
    worker_count: usize,
    req_tx: Sender<Request>,
    useful: Arc<AtomicUsize>,
    received: Arc<AtomicUsize>,
    stopped_workers: Arc<AtomicUsize>,
    cancelled: AtomicBool,
    shutdown_tx: Option<Sender<()>>,
    supervisor_handle: Option<JoinHandle<()>>,
    worker_handles: Vec<JoinHandle<()>>,
}

impl ParallelDecoderState {
    /// Spawns the supervisor and `clamp(piece_byte_len / 32, 1, 2 * cpus)`
    /// workers, each owning a contiguous range of payload columns; the last
    /// worker absorbs the remainder.
    pub fn new(piece_byte_len: usize, piece_count: usize) -> Result<Self, CodingError> {
        if piece_byte_len == 0 {
            return Err(CodingError::ZeroPieceSize);
        }
        if piece_count < 2 {
            return Err(CodingError::BadPieceCount);
        }

        let cpus = thread::available_parallelism().map_or(1, std::num::NonZero::get);
        let worker_count = (piece_byte_len / COLUMNS_PER_WORKER).clamp(1, 2 * cpus);
        let columns_per_worker = piece_byte_len / worker_count;

        let coded = Arc::new(PayloadMatrix::with_row_capacity(piece_count));
        let useful = Arc::new(AtomicUsize::new(0));
        let received = Arc::new(AtomicUsize::new(0));
        let stopped_workers = Arc::new(AtomicUsize::new(0));

        let (req_tx, req_rx) = bounded(piece_count);
        // Pure signal channel: nothing is ever sent, receivers observe the
        // disconnect when the handle drops its sender.
        let (shutdown_tx, shutdown_rx) = bounded::<()>(0);

        let mut work_txs = Vec::with_capacity(worker_count);
        let mut drained = Vec::with_capacity(worker_count);
        let mut worker_handles = Vec::with_capacity(worker_count);

        for worker_idx in 0..worker_count {
            // One admission enqueues at most 2 * piece_count + 1 items.
            let (work_tx, work_rx) = bounded(2 * piece_count + 1);
            let worker_drained = Arc::new(AtomicUsize::new(0));

            let column_start = worker_idx * columns_per_worker;
            let column_end = if worker_idx == worker_count - 1 {
                piece_byte_len
            } else {
                column_start + columns_per_worker
            };

            let worker = Worker {
                work_rx,
                shutdown_rx: shutdown_rx.clone(),
                coded: Arc::clone(&coded),
                column_start,
                column_end,
                drained: Arc::clone(&worker_drained),
                stopped_workers: Arc::clone(&stopped_workers),
            };

            work_txs.push(work_tx);
            drained.push(worker_drained);
            worker_handles.push(thread::spawn(move || worker.run()));
        }

        let supervisor = Supervisor {
            piece_count,
            piece_byte_len,
            coeffs: Matrix::with_row_capacity(piece_count),
            coded,
            req_rx,
            shutdown_rx,
            work_txs,
            issued: 0,
            drained,
            useful: Arc::clone(&useful),
            received: Arc::clone(&received),
        };
        let supervisor_handle = thread::spawn(move || supervisor.run());

        Ok(ParallelDecoderState {
            piece_count,
            piece_byte_len,
            worker_count,
            req_tx,
            useful,
            received,
            stopped_workers,
            cancelled: AtomicBool::new(false),
            shutdown_tx: Some(shutdown_tx),
            supervisor_handle: Some(supervisor_handle),
            worker_handles,
        })
    }

    /// Number of originals coded together in this generation.
    pub fn piece_count(&self) -> usize {
        self.piece_count
    }

    pub fn piece_byte_len(&self) -> usize {
        self.piece_byte_len
    }

    pub fn coded_piece_byte_len(&self) -> usize {
        self.piece_count + self.piece_byte_len
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Pieces admitted so far, the linearly dependent ones included.
    pub fn received_piece_count(&self) -> usize {
        self.received.load(Ordering::Acquire)
    }

    /// Linearly independent pieces held so far.
    pub fn useful_piece_count(&self) -> usize {
        self.useful.load(Ordering::Acquire)
    }

    /// How many more useful pieces decoding still needs.
    pub fn remaining_piece_count(&self) -> usize {
        self.piece_count - self.useful_piece_count()
    }

    /// True once enough independent pieces arrived *and* every worker has
    /// acknowledged its stop sentinel, i.e. all payload work has drained.
    pub fn is_decoded(&self) -> bool {
        self.useful_piece_count() >= self.piece_count && self.stopped_workers.load(Ordering::Acquire) == self.worker_count
    }

    /// Submits one coded piece to the supervisor and waits for its verdict.
    ///
    /// Linear dependence is not an error: the piece is silently dropped and
    /// `Ok(())` is returned. `AllUsefulPiecesReceived` signals the feeder to
    /// stop. Blocks while the request queue is full.
    pub fn add_piece(&self, coded_piece: CodedPiece) -> Result<(), CodingError> {
        if self.cancelled.load(Ordering::Acquire) {
            return Err(CodingError::DecodingCancelled);
        }

        let (reply_tx, reply_rx) = bounded(1);
        self.req_tx
            .send(Request::AddPiece {
                coded_piece,
                reply: reply_tx,
            })
            .map_err(|_| CodingError::DecodingCancelled)?;
        reply_rx.recv().map_err(|_| CodingError::DecodingCancelled)?
    }

    /// Requests a decoded piece by index through the supervisor, so the
    /// returned snapshot is consistent with the coefficient matrix. The
    /// payload is always a copy.
    pub fn get_piece(&self, piece_index: usize) -> Result<Piece, CodingError> {
        if self.cancelled.load(Ordering::Acquire) {
            return Err(CodingError::DecodingCancelled);
        }

        let (reply_tx, reply_rx) = bounded(1);
        self.req_tx
            .send(Request::GetPiece {
                piece_index,
                reply: reply_tx,
            })
            .map_err(|_| CodingError::DecodingCancelled)?;
        reply_rx.recv().map_err(|_| CodingError::DecodingCancelled)?
    }

    /// All original pieces in order, once decoding completed.
    pub fn get_pieces(&self) -> Result<Vec<Piece>, CodingError> {
        if self.useful_piece_count() < self.piece_count {
            return Err(CodingError::MoreUsefulPiecesRequired);
        }

        // The stop sentinels are already in flight; wait for the pool to
        // acknowledge them.
        while self.stopped_workers.load(Ordering::Acquire) < self.worker_count {
            if self.cancelled.load(Ordering::Acquire) {
                return Err(CodingError::DecodingCancelled);
            }
            thread::yield_now();
        }

        (0..self.piece_count).map(|piece_index| self.get_piece(piece_index)).collect()
    }

    /// Cooperative cancellation: closes the shutdown channel, which pops
    /// every task out of its dispatch loop. Outstanding and subsequent
    /// requests fail with `DecodingCancelled`; the decoder is not resumable.
    pub fn cancel(&mut self) {
        self.cancelled.store(true, Ordering::Release);
        drop(self.shutdown_tx.take());
    }
}

impl Drop for ParallelDecoderState {
    fn drop(&mut self) {
        self.cancel();

        if let Some(handle) = self.supervisor_handle.take() {
            let _ = handle.join();
        }
        for handle in self.worker_handles.drain(..) {
            let _ = handle.join();
        }
    }
}
