//! Trigger rates - how often a proc gets the chance to fire

use super::{ProcArchetype, ProcDescriptor};
use crate::error::{CalcError, CalcResult};
use crate::rates::{AttackRateTable, CritRateTable};
use crate::types::AttackKind;

/// Successful procs per second for a non-real-PPM proc
///
/// Sums the rates of every attack the trigger category accepts, weights them
/// by crit rate for on-crit procs, then applies the per-trigger chance.
pub fn procs_per_second(
    proc: &ProcDescriptor,
    attack_rates: &AttackRateTable,
    crit_rates: &CritRateTable,
) -> CalcResult<f64> {
    let behaviour = proc.behaviour();

    if matches!(behaviour.archetype, ProcArchetype::Ppm { .. }) {
        let trigger = behaviour.trigger;
        if trigger.procs_off_harmful_spells()
            || trigger.procs_off_periodic_spell_damage()
            || trigger.procs_off_bleeds()
        {
            return Err(CalcError::unmodeled(format!(
                "Unable to model PPM procs that trigger off spells ({})",
                proc.name
            )));
        }
    }

    let mut triggers_per_second = 0.0;
    for (key, entry) in attack_rates.iter() {
        if !behaviour.trigger.accepts(entry.kind) {
            continue;
        }
        if entry.kind == AttackKind::ProccedStrike && !behaviour.on_procced_strikes {
            continue;
        }
        // Debuff applications never crit
        if entry.kind == AttackKind::DebuffApplication && behaviour.on_crit {
            continue;
        }

        let mut rate = entry.rate.total();
        if behaviour.on_crit {
            let crit_rate = crit_rates.get(key).ok_or_else(|| {
                CalcError::unmodeled(format!(
                    "no crit rate for {key}, needed by on-crit proc {}",
                    proc.name
                ))
            })?;
            rate *= crit_rate;
        }
        triggers_per_second += rate;
    }

    let chance = behaviour.per_trigger_chance(&proc.name, proc.weapon_speed)?;
    Ok(triggers_per_second * chance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::procs::{ProcBehaviour, ProcEffect};
    use crate::types::{Stat, TriggerCategory};

    fn rates() -> AttackRateTable {
        let mut rates = AttackRateTable::new()
            .with_scalar("mh_autoattack", AttackKind::AutoAttack, 1.0)
            .with_scalar("sinister_strike", AttackKind::Strike, 0.5)
            .with_scalar("main_gauche", AttackKind::ProccedStrike, 0.25)
            .with_scalar("deadly_poison", AttackKind::DebuffApplication, 0.4)
            .with_scalar("rupture_ticks", AttackKind::Bleed, 0.5);
        rates.insert_per_resource("eviscerate", AttackKind::Finisher, vec![0.0, 0.0, 0.0, 0.0, 0.1, 0.1]);
        rates
    }

    fn crits() -> CritRateTable {
        CritRateTable::new()
            .with("mh_autoattack", 0.2)
            .with("sinister_strike", 0.4)
            .with("main_gauche", 0.2)
            .with("eviscerate", 0.5)
            .with("rupture_ticks", 0.1)
    }

    fn proc_with(behaviour: ProcBehaviour) -> ProcDescriptor {
        ProcDescriptor::new(
            "test_proc",
            ProcEffect::Stat {
                stat: Stat::Agility,
                value: 500.0,
            },
            10.0,
            behaviour,
        )
    }

    #[test]
    fn test_strike_trigger_sums_strikes_and_finishers() {
        let proc = proc_with(ProcBehaviour::chance(1.0, TriggerCategory::Strikes));
        let pps = procs_per_second(&proc, &rates(), &crits()).unwrap();
        // sinister_strike + main_gauche + eviscerate
        assert!((pps - 0.95).abs() < 1e-12);
    }

    #[test]
    fn test_procced_strikes_excluded() {
        let mut behaviour = ProcBehaviour::chance(1.0, TriggerCategory::Strikes);
        behaviour.on_procced_strikes = false;
        let pps = procs_per_second(&proc_with(behaviour), &rates(), &crits()).unwrap();
        assert!((pps - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_on_crit_weighting() {
        let behaviour = ProcBehaviour::chance(0.5, TriggerCategory::AllAttacks).on_crit_only();
        let pps = procs_per_second(&proc_with(behaviour), &rates(), &crits()).unwrap();
        // 1.0*0.2 + 0.5*0.4 + 0.25*0.2 + 0.2*0.5, poison skipped
        let expected = (0.2 + 0.2 + 0.05 + 0.1) * 0.5;
        assert!((pps - expected).abs() < 1e-12);
    }

    #[test]
    fn test_on_crit_missing_crit_rate() {
        let behaviour = ProcBehaviour::chance(1.0, TriggerCategory::Strikes).on_crit_only();
        let rates = rates().with_scalar("ambush", AttackKind::Strike, 0.1);
        let err = procs_per_second(&proc_with(behaviour), &rates, &crits()).unwrap_err();
        assert!(matches!(err, CalcError::UnmodeledInput(_)));
    }

    #[test]
    fn test_weapon_ppm() {
        let proc = proc_with(ProcBehaviour::ppm(1.0, TriggerCategory::AutoAttacks))
            .with_weapon_speed(2.6);
        let pps = procs_per_second(&proc, &rates(), &crits()).unwrap();
        assert!((pps - 2.6 / 60.0).abs() < 1e-12);
    }

    #[test]
    fn test_weapon_ppm_off_spells_unmodeled() {
        let proc = proc_with(ProcBehaviour::ppm(1.0, TriggerCategory::AllSpellsAndAttacks))
            .with_weapon_speed(2.6);
        let err = procs_per_second(&proc, &rates(), &crits()).unwrap_err();
        assert!(matches!(err, CalcError::UnmodeledInput(_)));
    }

    #[test]
    fn test_no_matching_attacks() {
        let proc = proc_with(ProcBehaviour::chance(1.0, TriggerCategory::Hots));
        let pps = procs_per_second(&proc, &rates(), &crits()).unwrap();
        assert!(pps.abs() < f64::EPSILON);
    }
}
