use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::Header;
use rocket::response::status::NoContent;
use rocket::{Request, Response};

/// Adds CORS headers for the dashboard's origin ("*" admits any origin).
pub struct Cors {
    origin: String,
}

impl Cors {
    pub fn new(origin: &str) -> Self {
        Self {
            origin: origin.to_string(),
        }
    }

    fn allows(&self, origin: &str) -> bool {
        self.origin == "*" || self.origin.eq_ignore_ascii_case(origin)
    }
}

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "CORS Headers",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, req: &'r Request<'_>, res: &mut Response<'r>) {
        let origin = match req.headers().get_one("Origin") {
            Some(o) if self.allows(o) => o.to_string(),
            _ => return,
        };
        res.set_header(Header::new("Access-Control-Allow-Origin", origin));
        res.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "GET, POST, PUT, DELETE, OPTIONS",
        ));
        res.set_header(Header::new("Access-Control-Allow-Headers", "Content-Type"));
        res.set_header(Header::new("Vary", "Origin"));
    }
}

/// Answers every preflight; the fairing supplies the headers.
#[options("/<_..>")]
pub fn preflight() -> NoContent {
    NoContent
}

pub fn routes() -> Vec<rocket::Route> {
    routes![preflight]
}
