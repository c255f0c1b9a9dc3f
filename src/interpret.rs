// MIT License - Copyright (c) 2026 bolid-bridge developers

//! Physical interpretation of raw 8-bit ADC readings.
//!
//! Each device family encodes a different physical quantity in the same
//! byte: conventional loops report resistance, addressable sensors report
//! smoke/temperature/humidity levels, and power supplies report voltages
//! and currents with a fixed meaning per branch index.

use crate::devices::catalog::{is_addressable_loop, is_power_supply};

/// Convert an ADC code to a loop resistance in kΩ.
///
/// `238/adc − 0.8` approximates the transfer curve; a three-segment linear
/// correction flattens the residual error of the hardware's non-linear
/// divider. Zero means no current flows, i.e. an open loop.
pub fn calculate_resistance(adc: u8) -> f32 {
    if adc == 0 {
        return f32::INFINITY;
    }
    let adc_f = adc as f32;
    let base = 238.0 / adc_f - 0.8;
    let correction = if adc >= 80 {
        -0.185 + (adc_f - 80.0) * 0.077
    } else if adc >= 40 {
        -0.31 + (adc_f - 40.0) * 0.003125
    } else {
        -0.31 - (40.0 - adc_f) * 0.01
    };
    ((base + correction) * 100.0).round() / 100.0
}

/// Five-band classification of a loop resistance.
pub fn resistance_status(resistance: f32) -> &'static str {
    if resistance < 0.1 {
        "short circuit"
    } else if resistance < 1.8 {
        "fault, low resistance"
    } else if (2.2..=5.4).contains(&resistance) {
        "normal"
    } else if resistance <= 6.6 {
        "fault, high resistance"
    } else if resistance <= 25.0 {
        "fault, high resistance"
    } else {
        "open circuit"
    }
}

/// Guess the sensor family on an addressable loop from its ADC band and
/// last known state code.
pub fn detect_sensor_type(adc: u8, state_code: u8) -> &'static str {
    if (30..=120).contains(&adc) {
        if state_code == 204 || state_code == 187 {
            "smoke detector (ДИП-34А), maintenance required"
        } else {
            "smoke detector (ДИП-34А)"
        }
    } else if adc < 30 {
        "heat detector (С2000-ИП)"
    } else {
        "humidity sensor (С2000-ВТ)"
    }
}

/// Render a human-readable interpretation of an ADC reading for the given
/// device type code. `state_code` and `branch` refine the interpretation
/// where the family needs them.
pub fn interpret_adc_for_device(
    adc: u8,
    device_code: u8,
    state_code: Option<u8>,
    branch: Option<u8>,
) -> String {
    if adc == 0 {
        return "open circuit".to_string();
    }

    // Resistive two-state loops, including the КПБ control block.
    if matches!(device_code, 1 | 2 | 11 | 15 | 26 | 32 | 34) {
        let resistance = calculate_resistance(adc);
        if resistance.is_infinite() {
            return "open circuit".to_string();
        }
        return format!("resistance {resistance} kΩ ({})", resistance_status(resistance));
    }

    if is_addressable_loop(device_code) {
        return match state_code {
            Some(code) => {
                let sensor = detect_sensor_type(adc, code);
                if sensor.starts_with("smoke") {
                    let level = if adc < 50 {
                        "low"
                    } else if adc < 100 {
                        "medium"
                    } else {
                        "high"
                    };
                    format!("smoke level {level} (ADC {adc})")
                } else if sensor.starts_with("heat") {
                    format!("temperature {adc} °C (ADC {adc})")
                } else {
                    format!("humidity {adc} % (ADC {adc})")
                }
            }
            None => {
                let level = if adc < 50 {
                    "low"
                } else if adc < 100 {
                    "medium"
                } else if adc < 150 {
                    "high"
                } else {
                    "very high"
                };
                format!("{level} level (ADC {adc})")
            }
        };
    }

    if is_power_supply(device_code) {
        return interpret_power_adc(adc, branch.unwrap_or(0));
    }

    format!("ADC code {adc}")
}

/// Interpret a power-supply (МИП/РИП) ADC reading. Branch indices carry
/// fixed meanings: 1 output voltage, 2 load current, 3 battery voltage,
/// 4 charger status, 5 mains voltage.
pub fn interpret_power_adc(adc: u8, branch: u8) -> String {
    if adc == 0 {
        return if branch == 3 {
            "battery disconnected".to_string()
        } else {
            "no data".to_string()
        };
    }

    match branch {
        1 => {
            let voltage = adc as f32 * 0.125;
            let status = if voltage < 20.0 {
                "low"
            } else if voltage > 30.0 {
                "high"
            } else {
                "normal"
            };
            format!("output voltage {voltage:.2} V ({status})")
        }
        2 => {
            let current = adc as f32 * 0.035;
            let status = if current < 0.1 {
                "low"
            } else if current > 2.0 {
                "high"
            } else {
                "normal"
            };
            format!("load current {current:.2} A ({status})")
        }
        3 => {
            let voltage = adc as f32 * 0.125;
            let status = if voltage < 10.0 {
                "discharged"
            } else if voltage > 14.0 {
                "overcharged"
            } else {
                "normal"
            };
            format!("battery voltage {voltage:.2} V ({status})")
        }
        4 => {
            let status = if adc >= 200 {
                "normal"
            } else if adc >= 100 {
                "warning"
            } else if adc >= 50 {
                "fault"
            } else {
                "off"
            };
            format!("charger: {status}")
        }
        5 => {
            let voltage = adc as f32 * 2.0;
            let status = if voltage < 180.0 {
                "low"
            } else if voltage > 250.0 {
                "high"
            } else {
                "normal"
            };
            format!("mains voltage {voltage:.1} V ({status})")
        }
        _ => format!("unknown parameter (ADC {adc})"),
    }
}

/// Interpret a relay's ADC reading as an on/off state. Devices report 0
/// for a released relay and a non-zero drive level (typically 37) for an
/// energised one.
pub fn interpret_relay_adc(adc: u8) -> bool {
    adc != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resistance_edge_values() {
        assert!(calculate_resistance(0).is_infinite());
        assert_eq!(calculate_resistance(91), 2.48);
        assert_eq!(calculate_resistance(1), 236.5);
        assert_eq!(calculate_resistance(40), 4.84);
        assert_eq!(calculate_resistance(80), 1.99);
    }

    #[test]
    fn test_resistance_decreasing_below_knee() {
        // Up to the 80-ADC knee more current means less resistance; above
        // it the linear correction term dominates and the curve rises.
        let mut prev = calculate_resistance(1);
        for adc in 2..=80u8 {
            let r = calculate_resistance(adc);
            assert!(r < prev, "resistance not decreasing at ADC {adc}: {r} >= {prev}");
            prev = r;
        }
    }

    #[test]
    fn test_resistance_status_bands() {
        assert_eq!(resistance_status(0.05), "short circuit");
        assert_eq!(resistance_status(1.0), "fault, low resistance");
        assert_eq!(resistance_status(2.2), "normal");
        assert_eq!(resistance_status(4.7), "normal");
        assert_eq!(resistance_status(5.4), "normal");
        assert_eq!(resistance_status(6.0), "fault, high resistance");
        assert_eq!(resistance_status(20.0), "fault, high resistance");
        assert_eq!(resistance_status(30.0), "open circuit");
        // The 1.8..2.2 gap falls into the high-resistance fault band.
        assert_eq!(resistance_status(2.0), "fault, high resistance");
    }

    #[test]
    fn test_interpret_resistive_loop() {
        assert_eq!(interpret_adc_for_device(0, 1, None, None), "open circuit");
        let text = interpret_adc_for_device(91, 1, None, None);
        assert!(text.contains("2.48"), "{text}");
        assert!(text.contains("normal"), "{text}");
    }

    #[test]
    fn test_interpret_addressable() {
        let smoke = interpret_adc_for_device(60, 9, Some(37), Some(1));
        assert_eq!(smoke, "smoke level medium (ADC 60)");
        let heat = interpret_adc_for_device(20, 9, Some(37), Some(1));
        assert!(heat.starts_with("temperature"), "{heat}");
        let humidity = interpret_adc_for_device(150, 9, Some(0), Some(1));
        assert!(humidity.starts_with("humidity"), "{humidity}");
        let no_state = interpret_adc_for_device(60, 9, None, None);
        assert_eq!(no_state, "medium level (ADC 60)");
    }

    #[test]
    fn test_interpret_power_supply() {
        assert_eq!(interpret_power_adc(108, 1), "output voltage 13.50 V (normal)");
        assert_eq!(interpret_power_adc(0, 3), "battery disconnected");
        assert_eq!(interpret_power_adc(0, 1), "no data");
        assert_eq!(interpret_power_adc(210, 4), "charger: normal");
        assert_eq!(interpret_power_adc(60, 4), "charger: fault");
        assert_eq!(interpret_power_adc(115, 5), "mains voltage 230.0 V (normal)");
        assert!(interpret_power_adc(50, 9).starts_with("unknown parameter"));
        // Through the generic entry point.
        let text = interpret_adc_for_device(108, 33, None, Some(1));
        assert_eq!(text, "output voltage 13.50 V (normal)");
    }

    #[test]
    fn test_interpret_unknown_family() {
        assert_eq!(interpret_adc_for_device(42, 7, None, None), "ADC code 42");
    }

    #[test]
    fn test_relay_adc() {
        assert!(!interpret_relay_adc(0));
        assert!(interpret_relay_adc(37));
        assert!(interpret_relay_adc(1));
    }

    #[test]
    fn test_sensor_detection() {
        assert_eq!(detect_sensor_type(60, 37), "smoke detector (ДИП-34А)");
        assert_eq!(
            detect_sensor_type(60, 204),
            "smoke detector (ДИП-34А), maintenance required"
        );
        assert_eq!(detect_sensor_type(20, 0), "heat detector (С2000-ИП)");
        assert_eq!(detect_sensor_type(150, 0), "humidity sensor (С2000-ВТ)");
    }
}
