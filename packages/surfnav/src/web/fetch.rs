use async_trait::async_trait;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{AbortController, Headers, RequestInit};

use crate::{
    error::TransportError,
    transport::{Request, Response, Transport},
};

/// Aborts the fetch it guards when dropped before completion.
struct AbortOnDrop {
    controller: AbortController,
    done: bool,
}

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        if !self.done {
            self.controller.abort();
        }
    }
}

fn network_error(err: JsValue) -> TransportError {
    let message = err
        .dyn_ref::<js_sys::Error>()
        .map(|err| String::from(err.message()))
        .or_else(|| err.as_string())
        .unwrap_or_else(|| format!("{err:?}"));
    TransportError::Network(message)
}

/// A [`Transport`] backed by `window.fetch`.
#[derive(Clone, Copy, Debug, Default)]
pub struct FetchTransport;

impl FetchTransport {
    fn build(
        &self,
        request: &Request,
        controller: &AbortController,
    ) -> Result<web_sys::Request, JsValue> {
        let headers = Headers::new()?;
        for (name, value) in request.header_pairs() {
            headers.append(name, value)?;
        }

        let init = RequestInit::new();
        init.set_method(request.method.as_str());
        init.set_headers(&headers);
        init.set_signal(Some(&controller.signal()));
        if let Some(body) = &request.body {
            init.set_body(&JsValue::from_str(body));
        }

        web_sys::Request::new_with_str_and_init(&request.url, &init)
    }
}

#[async_trait(?Send)]
impl Transport for FetchTransport {
    async fn request(&self, request: Request) -> Result<Response, TransportError> {
        let window =
            web_sys::window().ok_or_else(|| TransportError::Network("no window".to_string()))?;
        let controller = AbortController::new().map_err(network_error)?;
        let fetch_request = self.build(&request, &controller).map_err(network_error)?;

        let mut guard = AbortOnDrop {
            controller,
            done: false,
        };

        let result = JsFuture::from(window.fetch_with_request(&fetch_request)).await;
        let response = match result {
            Ok(response) => response.unchecked_into::<web_sys::Response>(),
            Err(_) if guard.controller.signal().aborted() => return Err(TransportError::Aborted),
            Err(err) => return Err(network_error(err)),
        };

        let text = response.text().map_err(network_error)?;
        let body = JsFuture::from(text)
            .await
            .map_err(network_error)?
            .as_string()
            .unwrap_or_default();
        guard.done = true;

        let url = response.url();
        Ok(Response {
            url: if url.is_empty() { request.url } else { url },
            status: response.status(),
            body,
        })
    }
}
