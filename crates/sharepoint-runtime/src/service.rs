//! Tool dispatch over the SharePoint client.

pub mod toolbox;
