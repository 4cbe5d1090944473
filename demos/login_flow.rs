//! Walks a small onboarding flow end to end: Login -> Consent -> Home, with
//! a help sub-flow attached and collapsed along the way. Run with
//! `cargo run --example login_flow`.

use serde::{Deserialize, Serialize};

use wayline::{
    Advance, Coordinator, FlowOwner, FlowPath, FlowStep, QueryRepresentable, Result, Screen,
    shared_owner,
};

struct Page {
    title: &'static str,
}

impl Screen for Page {
    fn name(&self) -> &str {
        self.title
    }
}

fn page(id: &str, title: &'static str) -> FlowStep {
    FlowStep::push(id, move || Some(Box::new(Page { title }) as Box<dyn Screen>))
}

#[derive(Serialize, Deserialize)]
struct Session {
    user: String,
    accepted: bool,
}

impl QueryRepresentable for Session {}

struct Host;

impl FlowOwner for Host {
    fn on_flow_completed(&mut self, coordinator: &Coordinator, query: Option<&str>) {
        println!(
            "owner: flow {:?} completed with payload {:?}",
            coordinator.identifier(),
            query
        );
        if let Some(session) = Session::from_query(query) {
            println!("owner: {} accepted = {}", session.user, session.accepted);
        }
    }
}

fn main() -> Result<()> {
    let owner = shared_owner(Host);
    let path = FlowPath::new(vec![
        page("login", "Login"),
        page("consent", "Consent"),
        page("home", "Home"),
    ])?;
    let mut coordinator = Coordinator::new(Some("onboarding".into()), path, Some(&owner))?;

    let session = Session {
        user: "ada".into(),
        accepted: false,
    };
    if let Advance::Pushed(consent) = coordinator.advance(session.to_query(), true)? {
        println!("now on {}", consent.name());
    }

    // The consent screen opens a help sub-flow; finishing it pops back.
    coordinator.attach(FlowPath::new(vec![page("help", "Help")])?)?;
    coordinator.advance(None, true)?;
    if let Advance::Collapsed(back) = coordinator.advance(None, true)? {
        println!("help finished, back on {}", back.name());
    }

    let accepted = Session {
        user: "ada".into(),
        accepted: true,
    };
    if let Advance::Pushed(home) = coordinator.advance(accepted.to_query(), true)? {
        println!(
            "now on {} (inputs changed since entry: {})",
            home.name(),
            home.has_changes(&accepted.to_query().unwrap_or_default())
        );
    }

    // Advancing past the final step completes the flow.
    coordinator.advance(accepted.to_query(), true)?;
    Ok(())
}
