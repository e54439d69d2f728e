use ntex::web;

/// Configures the WhatsApp webhook routes.
///
/// These routes are public endpoints, authenticated by the verify token and,
/// when configured, the payload signature.
///
/// # Routes
/// - `GET /webhook` - WhatsApp webhook verification
/// - `POST /webhook` - WhatsApp webhook receiver
pub fn whatsapp(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/webhook").service((super::whatsapp::verify, super::whatsapp::receive)));
}
