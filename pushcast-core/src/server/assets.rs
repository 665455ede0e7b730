//! Browser client assets, embedded in the binary and served at `/`

use warp::Filter;

const INDEX_HTML: &str = include_str!("../../static/index.html");
const SCRIPT_JS: &str = include_str!("../../static/script.js");
const STYLE_CSS: &str = include_str!("../../static/style.css");

/// Create routes for the static web UI
pub fn create_asset_routes(
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    // GET / and GET /index.html
    let index = warp::path::end()
        .or(warp::path!("index.html"))
        .unify()
        .and(warp::get())
        .map(|| warp::reply::html(INDEX_HTML));

    // GET /script.js
    let script = warp::path!("script.js").and(warp::get()).map(|| {
        warp::reply::with_header(
            SCRIPT_JS,
            "content-type",
            "application/javascript; charset=utf-8",
        )
    });

    // GET /style.css
    let style = warp::path!("style.css")
        .and(warp::get())
        .map(|| warp::reply::with_header(STYLE_CSS, "content-type", "text/css; charset=utf-8"));

    index.or(script).or(style)
}
