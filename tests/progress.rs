//! Covers OSD-marked-out recovery-event detection and the byte-recovery
//! progress algorithm, plus the shared bar renderer (spec §4.8).

mod support;

use autoscaler_agent::{
    progress::{detect_osds_marked_out, events::Event},
    transport::{OsdId, OsdInfo, OsdMap, PgDump, PoolId},
};

fn osd_map_with_osds(in_weights: &[(u64, f64)]) -> OsdMap {
    OsdMap {
        epoch: 1,
        osds: in_weights
            .iter()
            .map(|&(id, w)| OsdInfo { id: OsdId(id), in_weight: w })
            .collect(),
        ..Default::default()
    }
}

#[test]
fn marking_an_osd_out_synthesizes_a_recovery_event_for_its_pgs() {
    let old_map = osd_map_with_osds(&[(0, 1.0), (1, 1.0)]);
    let new_map = osd_map_with_osds(&[(0, 0.0), (1, 1.0)]);
    let pg_dump = PgDump {
        pg_stats: vec![
            support::make_pg_stat(1, 0x1, &[1], &[0, 1], "active+recovering", 1000, 0),
            support::make_pg_stat(1, 0x2, &[1], &[1], "active+clean", 1000, 1000),
        ],
        osd_stats: vec![],
    };

    let events = detect_osds_marked_out(&old_map, &new_map, &pg_dump);
    assert_eq!(events.len(), 1);
    assert!(events[0].message().contains("osd.0"));
}

#[test]
fn an_osd_already_out_in_both_snapshots_is_not_reported_again() {
    let old_map = osd_map_with_osds(&[(0, 0.0)]);
    let new_map = osd_map_with_osds(&[(0, 0.0)]);
    let pg_dump = PgDump::default();

    assert!(detect_osds_marked_out(&old_map, &new_map, &pg_dump).is_empty());
}

#[test]
fn recovery_progress_is_monotonic_as_bytes_are_recovered_and_reaches_one() {
    use autoscaler_agent::progress::events::PgRecoveryEvent;
    use std::collections::BTreeSet;

    let mut pgs = BTreeSet::new();
    pgs.insert(autoscaler_agent::transport::PgId::new(PoolId(1), 0x1));
    let mut evacuate = BTreeSet::new();
    evacuate.insert(OsdId(0));

    let mut ev = PgRecoveryEvent::new("rebalancing".to_string(), pgs, evacuate);

    let mut dump = PgDump {
        pg_stats: vec![support::make_pg_stat(1, 0x1, &[1], &[0, 1], "active+recovering", 1000, 200)],
        osd_stats: vec![],
    };
    ev.update(&dump);
    let first = ev.progress();
    assert_eq!(first, 0.0, "no bytes recovered beyond the original snapshot yet");

    dump.pg_stats[0].stat_sum.num_bytes_recovered = 600;
    ev.update(&dump);
    let second = ev.progress();
    assert!(second > first);

    // PG finishes recovering and moves off the evacuated OSD.
    dump.pg_stats[0] = support::make_pg_stat(1, 0x1, &[1], &[1], "active+clean", 1000, 1000);
    ev.update(&dump);
    assert_eq!(ev.progress(), 1.0);
}

#[test]
fn bar_renders_proportional_to_progress() {
    use autoscaler_agent::progress::events::RemoteEvent;
    let mut ev = RemoteEvent::new("halfway");
    ev.set_progress(0.5);
    let bar = ev.render_bar(12);
    assert_eq!(bar, "[=====.....]");
}
