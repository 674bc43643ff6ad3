use rocket::Route;

mod candidate;
mod contact_us;
mod locations;
mod login;
mod profile;
mod search;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(search::routes());
    routes.extend(candidate::routes());
    routes.extend(profile::routes());
    routes.extend(login::routes());
    routes.extend(contact_us::routes());
    routes.extend(locations::routes());
    routes
}
