//! Model download through `fetch`

use spincanvas_scene::loader::parse_gltf;
use spincanvas_scene::{AssetLoader, LoadError, LoadRequest, LoadedAsset};
use wasm_bindgen_futures::spawn_local;

use crate::events::{dispatch, CanvasLink};

/// Fetches and parses the model off the render path, then reports back
pub struct FetchLoader {
    link: CanvasLink,
}

impl FetchLoader {
    pub fn new(link: CanvasLink) -> Self {
        Self { link }
    }
}

impl AssetLoader for FetchLoader {
    fn start(&mut self, request: LoadRequest) {
        let link = self.link.clone();
        spawn_local(async move {
            tracing::info!("Fetching model from: {}", request.path);
            let result = fetch_model(&request.path).await;
            if request.ticket.token.is_cancelled() {
                tracing::debug!(path = %request.path, "Load finished after unmount, dropping result");
                return;
            }
            dispatch(&link, "load", move |canvas| canvas.on_load(request.ticket, result));
        });
    }
}

async fn fetch_model(url: &str) -> Result<LoadedAsset, LoadError> {
    let response = gloo_net::http::Request::get(url)
        .send()
        .await
        .map_err(|e| LoadError::Fetch(e.to_string()))?;

    if !response.ok() {
        return Err(LoadError::Http {
            status: response.status(),
            status_text: response.status_text(),
        });
    }

    let bytes = response
        .binary()
        .await
        .map_err(|e| LoadError::Fetch(e.to_string()))?;
    parse_gltf(&bytes)
}
