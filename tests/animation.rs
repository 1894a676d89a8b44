use weathervane::color::{blend_phase, ConditionColorTable, RGB8};
use weathervane::easing::ease;
use weathervane::weather::ConditionKey;

fn channels(color: RGB8) -> [u8; 3] {
    [color.r, color.g, color.b]
}

#[test]
fn rain_rises_to_secondary_and_returns() {
    let pair = ConditionColorTable::global().lookup(&ConditionKey::from_icon("10"));
    assert_eq!(pair, ConditionColorTable::global().lookup(&ConditionKey::from_icon("10d")));

    let frames: Vec<[u8; 3]> = [0, 500, 1000, 1500, 2000, 2500, 3000, 3500]
        .iter()
        .map(|&t| channels(blend_phase(&pair, ease(t))))
        .collect();

    let primary = channels(pair.primary);
    let secondary = channels(pair.secondary);
    assert_eq!(frames[0], primary);
    assert_eq!(frames[4], secondary);

    for channel in 0..3 {
        if primary[channel] == secondary[channel] {
            assert!(frames.iter().all(|frame| frame[channel] == primary[channel]));
            continue;
        }
        let rising = secondary[channel] > primary[channel];

        // 0..2000 heads for the secondary color, 2000..4000 heads back
        for (half, toward_secondary) in [(&frames[0..5], true), (&frames[4..8], false)] {
            for step in half.windows(2) {
                let (a, b) = (step[0][channel], step[1][channel]);
                if rising == toward_secondary {
                    assert!(b > a, "channel {channel}: {a} then {b}");
                } else {
                    assert!(b < a, "channel {channel}: {a} then {b}");
                }
            }
        }
    }

    // one more step closes the loop
    assert_eq!(channels(blend_phase(&pair, ease(4000))), primary);
}

#[test]
fn sentinel_oscillates_red_black() {
    let pair = ConditionColorTable::global().lookup(&ConditionKey::unknown());
    for t in (0..8000).step_by(50) {
        let color = blend_phase(&pair, ease(t));
        assert_eq!((color.g, color.b), (0, 0));
    }
    assert_eq!(channels(blend_phase(&pair, ease(0))), [255, 0, 0]);
    assert_eq!(channels(blend_phase(&pair, ease(2000))), [0, 0, 0]);
    assert_eq!(channels(blend_phase(&pair, ease(6000))), [0, 0, 0]);
}
