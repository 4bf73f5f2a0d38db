//! Dining Table API 模块
//!
//! # 路由列表
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/tables | GET | 全部桌台 (按编号排序) |
//! | /api/tables | POST | 创建桌台 |
//! | /api/tables/layout | PUT | 批量保存位置 |
//! | /api/tables/join | POST | 拼桌 |
//! | /api/tables/{id} | GET / PUT / DELETE | 单个桌台 |
//! | /api/tables/{id}/position | PUT | 移动桌台 |
//! | /api/tables/{id}/occupancy | PUT | 设置占用状态 |
//! | /api/tables/{id}/disjoin | POST | 拆桌 |
//! | /api/tables/{id}/order | GET | 所属桌组的账单 |
//! | /api/tables/{id}/settle | POST | 结账 |

mod handler;

use axum::Router;
use axum::routing::{get, post, put};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/tables", routes())
}

fn routes() -> Router<ServerState> {
    let floor_routes = Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/layout", put(handler::save_layout))
        .route("/join", post(handler::join));

    let table_routes = Router::new()
        .route(
            "/{id}",
            get(handler::get_by_id)
                .put(handler::update)
                .delete(handler::delete),
        )
        .route("/{id}/position", put(handler::update_position))
        .route("/{id}/occupancy", put(handler::update_occupancy))
        .route("/{id}/disjoin", post(handler::disjoin))
        .route("/{id}/order", get(handler::get_order))
        .route("/{id}/settle", post(handler::settle));

    floor_routes.merge(table_routes)
}
