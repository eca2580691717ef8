//! Utilities.
use anyhow::{anyhow, Result};
use candle_core::{Device, Tensor};
use candle_nn::VarMap;
use log::trace;
use naflab_core::{Action, State};

/// Apply soft update on variables.
///
/// Variables are identified by their names. With `tau = 1` the values of
/// `src` are copied.
///
/// dest = tau * src + (1.0 - tau) * dest
pub fn track(dest: &VarMap, src: &VarMap, tau: f64) -> Result<()> {
    trace!("track tau={}", tau);
    let dest = dest
        .data()
        .lock()
        .map_err(|_| anyhow!("Poisoned lock of the destination VarMap"))?;
    let src = src
        .data()
        .lock()
        .map_err(|_| anyhow!("Poisoned lock of the source VarMap"))?;

    for (k_dest, v_dest) in dest.iter() {
        let t_src = src
            .get(k_dest)
            .ok_or_else(|| anyhow!("Variable {} is not in the source VarMap", k_dest))?
            .as_tensor();
        if tau == 1.0 {
            v_dest.set(t_src)?;
        } else {
            let t_dest = ((t_src * tau)? + (v_dest.as_tensor() * (1.0 - tau))?)?;
            v_dest.set(&t_dest)?;
        }
    }

    Ok(())
}

fn rows_to_tensor(
    rows: impl Iterator<Item = Vec<f32>>,
    n: usize,
    device: &Device,
) -> Result<Tensor> {
    let data = rows.flatten().collect::<Vec<_>>();
    let dim = if n == 0 { 0 } else { data.len() / n };
    Ok(Tensor::from_vec(data, (n, dim), device)?)
}

/// Stacks states into an `f32` tensor of shape `[n, state_dim]`.
pub fn states_to_tensor(states: &[State], device: &Device) -> Result<Tensor> {
    rows_to_tensor(states.iter().map(|s| s.to_f32_vec()), states.len(), device)
}

/// Stacks actions into an `f32` tensor of shape `[n, action_dim]`.
pub fn actions_to_tensor(actions: &[Action], device: &Device) -> Result<Tensor> {
    rows_to_tensor(actions.iter().map(|a| a.to_f32_vec()), actions.len(), device)
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::DType;
    use candle_nn::Init;

    fn varmap_with(t: &Tensor) -> Result<VarMap> {
        let vm = VarMap::new();
        let init = Init::Randn {
            mean: 0.0,
            stdev: 1.0,
        };
        vm.get((3,), "var1", init, DType::F32, &Device::Cpu)?;
        vm.data().lock().unwrap().get("var1").unwrap().set(t)?;
        Ok(vm)
    }

    fn var1(vm: &VarMap) -> Tensor {
        vm.data()
            .lock()
            .unwrap()
            .get("var1")
            .unwrap()
            .as_tensor()
            .clone()
    }

    #[test]
    fn test_track() -> Result<()> {
        let tau = 0.7;
        let t_src = Tensor::from_slice(&[1.0f32, 2.0, 3.0], (3,), &Device::Cpu)?;
        let t_dest = Tensor::from_slice(&[4.0f32, 5.0, 6.0], (3,), &Device::Cpu)?;
        let t = ((&t_src * tau)? + (&t_dest * (1.0 - tau))?)?;

        let vm_src = varmap_with(&t_src)?;
        let vm_dest = varmap_with(&t_dest)?;
        track(&vm_dest, &vm_src, tau)?;

        let t_ = var1(&vm_dest);
        assert!((t - t_)?.abs()?.sum(0)?.to_scalar::<f32>()? < 1e-6);
        Ok(())
    }

    #[test]
    fn test_hard_copy_keeps_source() -> Result<()> {
        let t_src = Tensor::from_slice(&[1.0f32, 2.0, 3.0], (3,), &Device::Cpu)?;
        let t_dest = Tensor::from_slice(&[4.0f32, 5.0, 6.0], (3,), &Device::Cpu)?;
        let vm_src = varmap_with(&t_src)?;
        let vm_dest = varmap_with(&t_dest)?;
        track(&vm_dest, &vm_src, 1.0)?;
        assert_eq!(var1(&vm_dest).to_vec1::<f32>()?, vec![1.0, 2.0, 3.0]);

        // The copy does not alias the source.
        let t_new = Tensor::from_slice(&[7.0f32, 8.0, 9.0], (3,), &Device::Cpu)?;
        vm_src.data().lock().unwrap().get("var1").unwrap().set(&t_new)?;
        assert_eq!(var1(&vm_dest).to_vec1::<f32>()?, vec![1.0, 2.0, 3.0]);
        Ok(())
    }

    #[test]
    fn test_states_to_tensor() -> Result<()> {
        let states = vec![State::from(vec![0.0, 1.0]), State::from(vec![2.0, 3.0])];
        let t = states_to_tensor(&states, &Device::Cpu)?;
        assert_eq!(t.dims(), &[2, 2]);
        assert_eq!(t.to_vec2::<f32>()?, vec![vec![0.0, 1.0], vec![2.0, 3.0]]);
        Ok(())
    }
}
