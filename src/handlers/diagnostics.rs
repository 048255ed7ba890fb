use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};
use std::sync::{Mutex, OnceLock};
use sysinfo::System;
use tracing::info;

use crate::models::{DiagnosticsResponse, RoomDiagnostics};
use crate::services::Identity;
use crate::AppState;

static SYSTEM_MONITOR: OnceLock<Mutex<System>> = OnceLock::new();

/// Report live connections, rooms and process load
pub async fn diagnostics(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> (StatusCode, Json<DiagnosticsResponse>) {
    let rooms = state.registry.rooms();
    let mut room_stats: Vec<RoomDiagnostics> = rooms
        .documents()
        .into_iter()
        .map(|document_id| RoomDiagnostics {
            n_members: rooms.members_of(&document_id).len() as u32,
            document_id,
        })
        // A room can empty out between `documents()` and `members_of`
        .filter(|room| room.n_members > 0)
        .collect();
    room_stats.sort_by(|a, b| a.document_id.cmp(&b.document_id));

    let n_conn = state.registry.connection_count() as u32;
    let n_rooms = room_stats.len() as u32;

    let (cpu_usage, memory_alloc, memory_free, memory_total) = {
        let sys_lock = SYSTEM_MONITOR.get_or_init(|| Mutex::new(System::new_all()));
        match sys_lock.lock() {
            Ok(mut sys) => {
                sys.refresh_cpu();
                sys.refresh_memory();
                (
                    sys.global_cpu_info().cpu_usage(),
                    sys.used_memory(),
                    sys.free_memory(),
                    sys.total_memory(),
                )
            }
            Err(_) => (0.0, 0, 0, 0),
        }
    };

    info!(
        "Diagnostics for {}: CPU: {:.2}%, Mem: {}/{} MB, Conn: {}, Rooms: {}",
        identity.email,
        cpu_usage,
        memory_alloc / 1024 / 1024,
        memory_total / 1024 / 1024,
        n_conn,
        n_rooms
    );

    (
        StatusCode::OK,
        Json(DiagnosticsResponse {
            n_conn,
            n_rooms,
            rooms: room_stats,
            cpu_usage,
            memory_alloc,
            memory_total,
            memory_free,
        }),
    )
}
