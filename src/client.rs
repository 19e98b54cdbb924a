use std::env;

use reqwest::blocking::ClientBuilder;
use reqwest::Proxy;

use crate::error::Result;

pub fn get_proxied_client_builder() -> Result<ClientBuilder> {
    let mut cb = ClientBuilder::new();

    trace!("get_proxied_client_builder.http_proxy.before_check");
    if let Ok(http_proxy) = env::var("http_proxy") {
        trace!("get_proxied_client_builder.http_proxy.set");
        cb = cb.proxy(Proxy::http(&http_proxy)?);
    }

    trace!("get_proxied_client_builder.https_proxy.before_check");
    if let Ok(https_proxy) = env::var("https_proxy") {
        trace!("get_proxied_client_builder.https_proxy.set");
        cb = cb.proxy(Proxy::https(&https_proxy)?);
    }

    trace!("get_proxied_client_builder.done");
    Ok(cb)
}
