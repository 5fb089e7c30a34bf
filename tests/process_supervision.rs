//! Forked-isolation smoke path: child exit codes settle slot statuses.
//!
//! Kept as the only test in this binary so the forks happen while the test
//! process has a minimal thread set.

#![cfg(unix)]

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use servisor::{
    Config, Container, ContainerRef, EventKind, FactoryFn, FactoryRef, Formation, Options,
    ServiceError, ServiceFn, Supervisor,
};

struct Fixture {
    formation: Formation,
    factories: Vec<FactoryRef>,
    running: AtomicBool,
}

impl Container for Fixture {
    fn formation(&self) -> Formation {
        self.formation.clone()
    }

    fn service(&self, name: &str) -> Option<FactoryRef> {
        self.factories
            .iter()
            .find(|f| f.name() == name)
            .map(Arc::clone)
    }

    fn is_running(&self) -> bool {
        self.running.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[tokio::test(flavor = "current_thread")]
async fn forked_children_report_success_and_failure() {
    let good = FactoryFn::new("good", |_opts: &Options| {
        ServiceFn::arc_once("good", |_ctx: CancellationToken| async {
            Ok::<_, ServiceError>(())
        })
    })
    .arc();
    let bad = FactoryFn::new("bad", |_opts: &Options| {
        ServiceFn::arc_once("bad", |_ctx: CancellationToken| async {
            Err::<(), _>(ServiceError::Failed {
                error: "child crash".into(),
            })
        })
    })
    .arc();

    let mut formation = Formation::new();
    formation.set("good", Some(1));
    formation.set("bad", Some(1));

    let container: ContainerRef = Arc::new(Fixture {
        formation,
        factories: vec![good, bad],
        running: AtomicBool::new(true),
    });

    let supervisor = Supervisor::forked(Config::default());
    let mut events = supervisor.subscribe();

    supervisor.run(&container).await.expect("run");
    tokio::time::timeout(Duration::from_secs(30), supervisor.wait(&container))
        .await
        .expect("wait finished in time")
        .expect("wait");

    assert!(
        !supervisor.succeeded(),
        "one failed child poisons the aggregate outcome"
    );

    let mut stopped = 0;
    let mut failed = 0;
    while let Ok(ev) = events.try_recv() {
        match ev.kind {
            EventKind::ServiceStopped => stopped += 1,
            EventKind::ServiceFailed => failed += 1,
            _ => {}
        }
    }
    assert_eq!(stopped, 1, "the clean child exits zero");
    assert_eq!(failed, 1, "the crashing child exits non-zero");
}
